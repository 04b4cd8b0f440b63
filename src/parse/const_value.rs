use crate::ast::ConstValue;
use crate::lexer::TokenKind as TK;

use super::{ParseError, Parser};

impl<'a> Parser<'a> {
    pub(super) fn parse_const_value(&mut self) -> Result<ConstValue, ParseError> {
        match &self.curr_token.kind {
            TK::KwNull => {
                self.advance();
                Ok(ConstValue::Null)
            }
            TK::BoolLit(value) => {
                let value = *value;
                self.advance();
                Ok(ConstValue::Bool(value))
            }
            TK::IntLit(_) => Ok(ConstValue::Int(self.parse_signed_int_lit()?)),
            TK::FloatLit(value) => {
                let value = *value;
                self.advance();
                Ok(ConstValue::Float(value))
            }
            TK::Minus => {
                // A leading minus negates an int or float literal.
                let token = self.curr_token.clone();
                let mut ahead = self.pos + 1;
                if ahead >= self.tokens.len() {
                    ahead = self.tokens.len() - 1;
                }
                match &self.tokens[ahead].kind {
                    TK::FloatLit(value) => {
                        let value = *value;
                        self.advance();
                        self.advance();
                        Ok(ConstValue::Float(-value))
                    }
                    TK::IntLit(_) => Ok(ConstValue::Int(self.parse_signed_int_lit()?)),
                    _ => Err(ParseError::ExpectedConstValue(token)),
                }
            }
            TK::StringLit(value) => {
                let value = value.clone();
                self.advance();
                Ok(ConstValue::Str(value))
            }
            TK::BytesLit(value) => {
                let value = value.clone();
                self.advance();
                Ok(ConstValue::Bytes(value))
            }
            TK::Ident(_) => Ok(ConstValue::Symbol(self.parse_qual_ident()?)),
            _ => Err(ParseError::ExpectedConstValue(self.curr_token.clone())),
        }
    }
}
