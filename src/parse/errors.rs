use thiserror::Error;

use crate::diag::Span;
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Expected {0}, found: {1}")]
    ExpectedToken(TokenKind, Token),

    #[error("Expected identifier, found: {0}")]
    ExpectedIdent(Token),

    #[error("Expected declaration, found: {0}")]
    ExpectedDecl(Token),

    #[error("Expected type, found: {0}")]
    ExpectedType(Token),

    #[error("Expected constant value, found: {0}")]
    ExpectedConstValue(Token),

    #[error("Expected integer literal, found: {0}")]
    ExpectedIntLit(Token),

    #[error("Expected string literal, found: {0}")]
    ExpectedStringLit(Token),

    #[error("Expected method, found: {0}")]
    ExpectedMethod(Token),

    #[error("Integer literal out of range: {0}")]
    IntOutOfRange(Token),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::ExpectedToken(_, token) => token.span,
            ParseError::ExpectedIdent(token) => token.span,
            ParseError::ExpectedDecl(token) => token.span,
            ParseError::ExpectedType(token) => token.span,
            ParseError::ExpectedConstValue(token) => token.span,
            ParseError::ExpectedIntLit(token) => token.span,
            ParseError::ExpectedStringLit(token) => token.span,
            ParseError::ExpectedMethod(token) => token.span,
            ParseError::IntOutOfRange(token) => token.span,
        }
    }
}
