//! Lexer for `.hidl` source files.
//!
//! Produces span-tagged tokens; whitespace and comments (line and block)
//! are skipped. Reserved words, including all primitive type names, lex to
//! dedicated keyword tokens.

use std::fmt::{self, Display, Formatter};
use std::iter::Peekable;
use std::num::ParseIntError;
use std::str::Chars;
use thiserror::Error;

use crate::diag::{Position, Span, SpannedError};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    // Identifiers
    Ident(String),

    // Literals
    IntLit(u64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    BytesLit(Vec<u8>),

    // Structural keywords
    KwModule,
    KwImport,
    KwInterface,
    KwStruct,
    KwEnum,
    KwConst,
    KwRpc,
    KwOneway,
    KwStream,
    KwNotify,
    KwVector,
    KwMap,
    KwOptional,
    KwNull,

    // Primitive type keywords
    KwBool,
    KwI8,
    KwI16,
    KwI32,
    KwI64,
    KwU8,
    KwU16,
    KwU32,
    KwU64,
    KwF32,
    KwF64,
    KwString,
    KwBytes,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LessThan,
    GreaterThan,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Equals,
    Minus,
    Arrow,

    // End of file
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "Ident({name})"),
            TokenKind::IntLit(value) => write!(f, "IntLit({value})"),
            TokenKind::FloatLit(value) => write!(f, "FloatLit({value})"),
            TokenKind::BoolLit(value) => write!(f, "{value}"),
            TokenKind::StringLit(value) => write!(f, "StringLit({value:?})"),
            TokenKind::BytesLit(value) => write!(f, "BytesLit({} bytes)", value.len()),
            TokenKind::KwModule => f.write_str("module"),
            TokenKind::KwImport => f.write_str("import"),
            TokenKind::KwInterface => f.write_str("interface"),
            TokenKind::KwStruct => f.write_str("struct"),
            TokenKind::KwEnum => f.write_str("enum"),
            TokenKind::KwConst => f.write_str("const"),
            TokenKind::KwRpc => f.write_str("rpc"),
            TokenKind::KwOneway => f.write_str("oneway"),
            TokenKind::KwStream => f.write_str("stream"),
            TokenKind::KwNotify => f.write_str("notify"),
            TokenKind::KwVector => f.write_str("vector"),
            TokenKind::KwMap => f.write_str("map"),
            TokenKind::KwOptional => f.write_str("optional"),
            TokenKind::KwNull => f.write_str("null"),
            TokenKind::KwBool => f.write_str("bool"),
            TokenKind::KwI8 => f.write_str("i8"),
            TokenKind::KwI16 => f.write_str("i16"),
            TokenKind::KwI32 => f.write_str("i32"),
            TokenKind::KwI64 => f.write_str("i64"),
            TokenKind::KwU8 => f.write_str("u8"),
            TokenKind::KwU16 => f.write_str("u16"),
            TokenKind::KwU32 => f.write_str("u32"),
            TokenKind::KwU64 => f.write_str("u64"),
            TokenKind::KwF32 => f.write_str("f32"),
            TokenKind::KwF64 => f.write_str("f64"),
            TokenKind::KwString => f.write_str("string"),
            TokenKind::KwBytes => f.write_str("bytes"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LessThan => f.write_str("<"),
            TokenKind::GreaterThan => f.write_str(">"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Equals => f.write_str("="),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Arrow => f.write_str("->"),
            TokenKind::Eof => f.write_str("EOF"),
        }
    }
}

impl TokenKind {
    /// Keyword spelling for identifier-position reuse (qualified identifier
    /// components inside constant values may be reserved words).
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::KwModule => "module",
            TokenKind::KwImport => "import",
            TokenKind::KwInterface => "interface",
            TokenKind::KwStruct => "struct",
            TokenKind::KwEnum => "enum",
            TokenKind::KwConst => "const",
            TokenKind::KwRpc => "rpc",
            TokenKind::KwOneway => "oneway",
            TokenKind::KwStream => "stream",
            TokenKind::KwNotify => "notify",
            TokenKind::KwVector => "vector",
            TokenKind::KwMap => "map",
            TokenKind::KwOptional => "optional",
            TokenKind::KwNull => "null",
            TokenKind::KwBool => "bool",
            TokenKind::KwI8 => "i8",
            TokenKind::KwI16 => "i16",
            TokenKind::KwI32 => "i32",
            TokenKind::KwI64 => "i64",
            TokenKind::KwU8 => "u8",
            TokenKind::KwU16 => "u16",
            TokenKind::KwU32 => "u32",
            TokenKind::KwU64 => "u64",
            TokenKind::KwF32 => "f32",
            TokenKind::KwF64 => "f64",
            TokenKind::KwString => "string",
            TokenKind::KwBytes => "bytes",
            _ => return None,
        };
        Some(text)
    }
}

fn keyword_for(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "module" => TokenKind::KwModule,
        "import" => TokenKind::KwImport,
        "interface" => TokenKind::KwInterface,
        "struct" => TokenKind::KwStruct,
        "enum" => TokenKind::KwEnum,
        "const" => TokenKind::KwConst,
        "rpc" => TokenKind::KwRpc,
        "oneway" => TokenKind::KwOneway,
        "stream" => TokenKind::KwStream,
        "notify" => TokenKind::KwNotify,
        "vector" => TokenKind::KwVector,
        "map" => TokenKind::KwMap,
        "optional" => TokenKind::KwOptional,
        "null" => TokenKind::KwNull,
        "bool" => TokenKind::KwBool,
        "i8" => TokenKind::KwI8,
        "i16" => TokenKind::KwI16,
        "i32" => TokenKind::KwI32,
        "i64" => TokenKind::KwI64,
        "u8" => TokenKind::KwU8,
        "u16" => TokenKind::KwU16,
        "u32" => TokenKind::KwU32,
        "u64" => TokenKind::KwU64,
        "f32" => TokenKind::KwF32,
        "f64" => TokenKind::KwF64,
        "string" => TokenKind::KwString,
        "bytes" => TokenKind::KwBytes,
        "true" => TokenKind::BoolLit(true),
        "false" => TokenKind::BoolLit(false),
        _ => return None,
    };
    Some(kind)
}

#[derive(Debug, Clone, Error)]
pub enum LexErrorKind {
    #[error("Unexpected character: {0}")]
    UnexpectedCharacter(char),

    #[error("Invalid integer: {0}")]
    InvalidInteger(ParseIntError),

    #[error("Invalid float literal: {0}")]
    InvalidFloat(String),

    #[error("Invalid escape sequence: {0}")]
    InvalidEscapeSequence(String),

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unterminated block comment")]
    UnterminatedBlockComment,

    #[error("Invalid bytes literal: {0}")]
    InvalidBytesLiteral(String),
}

pub type LexError = SpannedError<LexErrorKind>;
pub use LexErrorKind as LEK;

impl LexErrorKind {
    pub fn at(self, span: Span) -> LexError {
        LexError::new(self, span)
    }
}

pub struct Lexer<'a> {
    source: Peekable<Chars<'a>>,
    pos: Position,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.chars().peekable(),
            pos: Position::start(),
            at_eof: false,
        }
    }

    fn advance(&mut self) {
        match self.source.next() {
            Some(ch) => {
                self.pos.offset += 1;
                if ch == '\n' {
                    self.pos.line += 1;
                    self.pos.column = 1;
                } else {
                    self.pos.column += 1;
                }
            }
            None => {
                self.at_eof = true;
            }
        }
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            while let Some(&ch) = self.source.peek() {
                if ch.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek_pair('/', '/') {
                // Consume '//' and skip until the end of the line.
                self.advance();
                self.advance();
                while let Some(&ch) = self.source.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            if self.peek_pair('/', '*') {
                let start = self.pos;
                self.advance();
                self.advance();
                loop {
                    if self.source.peek().is_none() {
                        return Err(
                            LEK::UnterminatedBlockComment.at(Span::new(start, self.pos))
                        );
                    }
                    if self.peek_pair('*', '/') {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
        Ok(())
    }

    fn peek_pair(&self, first: char, second: char) -> bool {
        let mut iter = self.source.clone();
        iter.next() == Some(first) && iter.next() == Some(second)
    }

    fn is_digit_for_base(ch: char, base: u32) -> bool {
        match base {
            2 => matches!(ch, '0' | '1'),
            8 => matches!(ch, '0'..='7'),
            16 => ch.is_ascii_hexdigit(),
            _ => ch.is_ascii_digit(),
        }
    }

    fn lex_number(&mut self, start: Position) -> Result<TokenKind, LexError> {
        // Decimal, 0x/0b/0o prefixed integers, or a standard float literal
        // (decimal digits with a fraction and/or exponent part).
        let mut base = 10u32;
        let mut digits = String::new();

        if matches!(self.source.peek(), Some(&'0')) {
            digits.push('0');
            self.advance();

            if let Some(&next) = self.source.peek() {
                match next {
                    'b' | 'B' => {
                        base = 2;
                        self.advance();
                        digits.clear();
                    }
                    'o' | 'O' => {
                        base = 8;
                        self.advance();
                        digits.clear();
                    }
                    'x' | 'X' => {
                        base = 16;
                        self.advance();
                        digits.clear();
                    }
                    _ => {}
                }
            }
        }

        while let Some(&ch) = self.source.peek() {
            if Self::is_digit_for_base(ch, base) {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if base == 10 {
            let mut is_float = false;
            if matches!(self.source.peek(), Some(&'.')) {
                // A fraction part requires a digit after the dot; a lone dot
                // belongs to a qualified identifier and is left alone.
                let mut ahead = self.source.clone();
                ahead.next();
                if matches!(ahead.next(), Some(d) if d.is_ascii_digit()) {
                    is_float = true;
                    digits.push('.');
                    self.advance();
                    while let Some(&ch) = self.source.peek() {
                        if ch.is_ascii_digit() {
                            digits.push(ch);
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
            if matches!(self.source.peek(), Some(&'e') | Some(&'E')) {
                let mut ahead = self.source.clone();
                ahead.next();
                let mut exp_head = ahead.next();
                if matches!(exp_head, Some('+') | Some('-')) {
                    exp_head = ahead.next();
                }
                if matches!(exp_head, Some(d) if d.is_ascii_digit()) {
                    is_float = true;
                    digits.push('e');
                    self.advance();
                    if let Some(&sign) = self.source.peek() {
                        if sign == '+' || sign == '-' {
                            digits.push(sign);
                            self.advance();
                        }
                    }
                    while let Some(&ch) = self.source.peek() {
                        if ch.is_ascii_digit() {
                            digits.push(ch);
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
            if is_float {
                let value = digits.parse::<f64>().map_err(|_| {
                    LEK::InvalidFloat(digits.clone()).at(Span::new(start, self.pos))
                })?;
                return Ok(TokenKind::FloatLit(value));
            }
        }

        if digits.is_empty() {
            // Base prefix with no digits, e.g. `0x`.
            let err = u64::from_str_radix("", base).unwrap_err();
            return Err(LEK::InvalidInteger(err).at(Span::new(start, self.pos)));
        }

        let value = if base == 10 {
            digits.parse::<u64>()
        } else {
            u64::from_str_radix(&digits, base)
        }
        .map_err(|e| LEK::InvalidInteger(e).at(Span::new(start, self.pos)))?;

        Ok(TokenKind::IntLit(value))
    }

    fn lex_string_lit(&mut self, start: Position) -> Result<TokenKind, LexError> {
        self.advance(); // consume opening quote
        let mut buf = String::new();

        loop {
            let Some(&ch) = self.source.peek() else {
                return Err(LEK::UnterminatedString.at(Span::new(start, self.pos)));
            };

            self.advance();

            match ch {
                '"' => break,
                '\\' => {
                    let unescaped = self.parse_escape(start)?;
                    buf.push(unescaped);
                }
                _ => buf.push(ch),
            }
        }

        Ok(TokenKind::StringLit(buf))
    }

    fn parse_escape(&mut self, start: Position) -> Result<char, LexError> {
        let esc = match self.source.peek().copied() {
            Some(c) => c,
            None => return Err(LEK::UnterminatedString.at(Span::new(start, self.pos))),
        };
        self.advance();

        let ch = match esc {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '"' => '"',
            '0' => '\0',
            'x' => {
                let mut hex = String::new();
                for _ in 0..2 {
                    let digit = self.source.peek().copied().ok_or_else(|| {
                        LEK::UnterminatedString.at(Span::new(start, self.pos))
                    })?;
                    self.advance();
                    hex.push(digit);
                }
                let byte = u8::from_str_radix(&hex, 16).map_err(|_| {
                    LEK::InvalidEscapeSequence(hex.clone()).at(Span::new(start, self.pos))
                })?;
                char::from(byte)
            }
            _ => {
                return Err(LEK::InvalidEscapeSequence(format!("\\{esc}"))
                    .at(Span::new(start, self.pos)));
            }
        };

        Ok(ch)
    }

    fn lex_bytes_lit(&mut self, start: Position) -> Result<TokenKind, LexError> {
        self.advance(); // consume 'b'
        self.advance(); // consume opening quote

        let mut bytes = Vec::new();
        let mut pending: Option<char> = None;

        loop {
            let Some(&ch) = self.source.peek() else {
                return Err(LEK::UnterminatedString.at(Span::new(start, self.pos)));
            };
            self.advance();

            match ch {
                '"' => break,
                c if c.is_whitespace() => {
                    if pending.is_some() {
                        return Err(LEK::InvalidBytesLiteral(
                            "hex digits must come in pairs".to_string(),
                        )
                        .at(Span::new(start, self.pos)));
                    }
                }
                c if c.is_ascii_hexdigit() => match pending.take() {
                    Some(high) => {
                        let pair = format!("{high}{c}");
                        let byte = u8::from_str_radix(&pair, 16).map_err(|_| {
                            LEK::InvalidBytesLiteral(pair.clone())
                                .at(Span::new(start, self.pos))
                        })?;
                        bytes.push(byte);
                    }
                    None => pending = Some(c),
                },
                c => {
                    return Err(LEK::InvalidBytesLiteral(format!(
                        "unexpected character '{c}'"
                    ))
                    .at(Span::new(start, self.pos)));
                }
            }
        }

        if pending.is_some() {
            return Err(
                LEK::InvalidBytesLiteral("odd number of hex digits".to_string())
                    .at(Span::new(start, self.pos)),
            );
        }

        Ok(TokenKind::BytesLit(bytes))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        let start = self.pos;
        let peeked = self.source.peek().copied();
        let kind = match peeked {
            Some('b') if self.peek_pair('b', '"') => self.lex_bytes_lit(start),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let mut ident = String::new();
                while let Some(&ch) = self.source.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Ok(keyword_for(&ident).unwrap_or(TokenKind::Ident(ident)))
            }
            Some(ch) if ch.is_ascii_digit() => self.lex_number(start),
            Some('"') => self.lex_string_lit(start),
            Some('-') => {
                self.advance();
                if matches!(self.source.peek(), Some(&'>')) {
                    self.advance();
                    Ok(TokenKind::Arrow)
                } else {
                    Ok(TokenKind::Minus)
                }
            }
            Some('{') => {
                self.advance();
                Ok(TokenKind::LBrace)
            }
            Some('}') => {
                self.advance();
                Ok(TokenKind::RBrace)
            }
            Some('(') => {
                self.advance();
                Ok(TokenKind::LParen)
            }
            Some(')') => {
                self.advance();
                Ok(TokenKind::RParen)
            }
            Some('[') => {
                self.advance();
                Ok(TokenKind::LBracket)
            }
            Some(']') => {
                self.advance();
                Ok(TokenKind::RBracket)
            }
            Some('<') => {
                self.advance();
                Ok(TokenKind::LessThan)
            }
            Some('>') => {
                self.advance();
                Ok(TokenKind::GreaterThan)
            }
            Some(',') => {
                self.advance();
                Ok(TokenKind::Comma)
            }
            Some('.') => {
                self.advance();
                Ok(TokenKind::Dot)
            }
            Some(':') => {
                self.advance();
                Ok(TokenKind::Colon)
            }
            Some(';') => {
                self.advance();
                Ok(TokenKind::Semicolon)
            }
            Some('=') => {
                self.advance();
                Ok(TokenKind::Equals)
            }
            Some(ch) => Err(LEK::UnexpectedCharacter(ch).at(Span::new(start, self.pos))),
            None => {
                self.at_eof = true;
                Ok(TokenKind::Eof)
            }
        }?;

        let end = self.pos;
        Ok(Token {
            kind,
            span: Span::new(start, end),
        })
    }

    pub fn tokenize(self) -> impl Iterator<Item = Result<Token, LexError>> + 'a {
        self
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at_eof {
            return None;
        }
        match self.next_token() {
            Ok(token) => Some(Ok(token)),
            Err(error) => Some(Err(error)),
        }
    }
}

#[cfg(test)]
#[path = "tests/t_lexer.rs"]
mod tests;
