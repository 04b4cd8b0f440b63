//! Recursive-descent parser for the IDL grammar.
//!
//! The parser walks a pre-lexed token slice. Each parse method returns the
//! first error it hits; there is no recovery inside a file.

use crate::ast::{Import, Module, QualIdent};
use crate::diag::{Position, Span};
use crate::lexer::{Token, TokenKind, TokenKind as TK};

mod const_value;
mod decl;
mod errors;
mod type_expr;

pub use errors::ParseError;

#[derive(Debug, Clone, Copy)]
struct Marker {
    pos: Position,
    token_index: usize,
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    curr_token: &'a Token,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            pos: 0,
            curr_token: &tokens[0],
        }
    }

    /// Parses a whole source file: module header, imports, declarations.
    pub fn parse(&mut self) -> Result<Module, ParseError> {
        let marker = self.mark();
        self.consume(&TK::KwModule)?;
        let name = self.parse_qual_ident()?;
        self.consume(&TK::Semicolon)?;

        let mut imports = Vec::new();
        while self.curr_token.kind == TK::KwImport {
            let import_marker = self.mark();
            self.advance();
            let path = self.parse_string_lit()?;
            self.consume(&TK::Semicolon)?;
            imports.push(Import {
                path,
                span: self.close(import_marker),
            });
        }

        let mut decls = Vec::new();
        while self.curr_token.kind != TK::Eof {
            decls.push(self.parse_declaration()?);
        }

        Ok(Module {
            name,
            imports,
            decls,
            span: self.close(marker),
        })
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
            self.curr_token = &self.tokens[self.pos];
        }
    }

    fn mark(&self) -> Marker {
        Marker {
            pos: self.curr_token.span.start,
            token_index: self.pos,
        }
    }

    fn close(&self, marker: Marker) -> Span {
        let end = if self.pos == marker.token_index {
            self.curr_token.span.end
        } else {
            self.tokens[self.pos - 1].span.end
        };
        Span::new(marker.pos, end)
    }

    fn consume(&mut self, expected: &TokenKind) -> Result<(), ParseError> {
        if self.curr_token.kind == *expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::ExpectedToken(
                expected.clone(),
                self.curr_token.clone(),
            ))
        }
    }

    fn consume_if(&mut self, expected: &TokenKind) -> bool {
        if self.curr_token.kind == *expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        if let TK::Ident(name) = &self.curr_token.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::ExpectedIdent(self.curr_token.clone()))
        }
    }

    /// An identifier component inside a qualified name; reserved words are
    /// allowed here so constant values can reference any symbol.
    fn parse_ident_or_keyword(&mut self) -> Result<String, ParseError> {
        if let TK::Ident(name) = &self.curr_token.kind {
            let name = name.clone();
            self.advance();
            return Ok(name);
        }
        if let Some(text) = self.curr_token.kind.keyword_text() {
            self.advance();
            return Ok(text.to_string());
        }
        Err(ParseError::ExpectedIdent(self.curr_token.clone()))
    }

    fn parse_qual_ident(&mut self) -> Result<QualIdent, ParseError> {
        let mut parts = vec![self.parse_ident()?];
        while self.curr_token.kind == TK::Dot {
            self.advance();
            parts.push(self.parse_ident_or_keyword()?);
        }
        Ok(QualIdent::new(parts))
    }

    fn parse_int_lit(&mut self) -> Result<u64, ParseError> {
        if let TK::IntLit(value) = &self.curr_token.kind {
            let value = *value;
            self.advance();
            Ok(value)
        } else {
            Err(ParseError::ExpectedIntLit(self.curr_token.clone()))
        }
    }

    fn parse_signed_int_lit(&mut self) -> Result<i64, ParseError> {
        let neg = self.curr_token.kind == TK::Minus;
        if neg {
            self.advance();
        }
        let token = self.curr_token.clone();
        let value = self.parse_int_lit()?;
        if neg {
            // -2^63 is representable; anything larger overflows i64.
            if value > (i64::MAX as u64) + 1 {
                return Err(ParseError::IntOutOfRange(token));
            }
            Ok((value as i64).wrapping_neg())
        } else {
            i64::try_from(value).map_err(|_| ParseError::IntOutOfRange(token))
        }
    }

    fn parse_string_lit(&mut self) -> Result<String, ParseError> {
        if let TK::StringLit(value) = &self.curr_token.kind {
            let value = value.clone();
            self.advance();
            Ok(value)
        } else {
            Err(ParseError::ExpectedStringLit(self.curr_token.clone()))
        }
    }
}

#[cfg(test)]
#[path = "../tests/t_parse.rs"]
mod tests;
