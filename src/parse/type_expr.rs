use crate::ast::{PrimitiveKind, Type};
use crate::lexer::TokenKind as TK;

use super::{ParseError, Parser};

impl<'a> Parser<'a> {
    pub(super) fn parse_type(&mut self) -> Result<Type, ParseError> {
        if let Some(kind) = primitive_for(&self.curr_token.kind) {
            self.advance();
            return Ok(Type::Primitive(kind));
        }

        match &self.curr_token.kind {
            TK::KwVector => {
                self.advance();
                self.consume(&TK::LessThan)?;
                let element = self.parse_type()?;
                self.consume(&TK::GreaterThan)?;
                Ok(Type::Vector(Box::new(element)))
            }
            TK::KwMap => {
                self.advance();
                self.consume(&TK::LessThan)?;
                let key = self.parse_type()?;
                self.consume(&TK::Comma)?;
                let value = self.parse_type()?;
                self.consume(&TK::GreaterThan)?;
                Ok(Type::Map(Box::new(key), Box::new(value)))
            }
            TK::KwOptional => {
                self.advance();
                self.consume(&TK::LessThan)?;
                let inner = self.parse_type()?;
                self.consume(&TK::GreaterThan)?;
                Ok(Type::Optional(Box::new(inner)))
            }
            TK::Ident(_) => {
                let name = self.parse_qual_ident()?;
                Ok(Type::User(name))
            }
            _ => Err(ParseError::ExpectedType(self.curr_token.clone())),
        }
    }
}

fn primitive_for(kind: &TK) -> Option<PrimitiveKind> {
    let primitive = match kind {
        TK::KwBool => PrimitiveKind::Bool,
        TK::KwI8 => PrimitiveKind::I8,
        TK::KwI16 => PrimitiveKind::I16,
        TK::KwI32 => PrimitiveKind::I32,
        TK::KwI64 => PrimitiveKind::I64,
        TK::KwU8 => PrimitiveKind::U8,
        TK::KwU16 => PrimitiveKind::U16,
        TK::KwU32 => PrimitiveKind::U32,
        TK::KwU64 => PrimitiveKind::U64,
        TK::KwF32 => PrimitiveKind::F32,
        TK::KwF64 => PrimitiveKind::F64,
        TK::KwString => PrimitiveKind::String,
        TK::KwBytes => PrimitiveKind::Bytes,
        _ => return None,
    };
    Some(primitive)
}
