use crate::ast::{
    Attribute, ConstDecl, Decl, EnumDecl, Enumerator, Field, InterfaceDecl, Method, MethodKind,
    MethodResult, StructDecl,
};
use crate::lexer::TokenKind as TK;

use super::{ParseError, Parser};

impl<'a> Parser<'a> {
    pub(super) fn parse_declaration(&mut self) -> Result<Decl, ParseError> {
        match self.curr_token.kind {
            TK::KwConst => Ok(Decl::Const(self.parse_const_decl()?)),
            TK::KwEnum => Ok(Decl::Enum(self.parse_enum_decl()?)),
            TK::KwStruct => Ok(Decl::Struct(self.parse_struct_decl()?)),
            TK::KwInterface => Ok(Decl::Interface(self.parse_interface_decl()?)),
            _ => Err(ParseError::ExpectedDecl(self.curr_token.clone())),
        }
    }

    fn parse_const_decl(&mut self) -> Result<ConstDecl, ParseError> {
        let marker = self.mark();
        self.consume(&TK::KwConst)?;
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        self.consume(&TK::Equals)?;
        let value = self.parse_const_value()?;
        self.consume(&TK::Semicolon)?;
        Ok(ConstDecl {
            ty,
            name,
            value,
            span: self.close(marker),
        })
    }

    fn parse_enum_decl(&mut self) -> Result<EnumDecl, ParseError> {
        let marker = self.mark();
        self.consume(&TK::KwEnum)?;
        let name = self.parse_ident()?;
        self.consume(&TK::LBrace)?;

        let mut items = Vec::new();
        while self.curr_token.kind != TK::RBrace {
            let item_marker = self.mark();
            let item_name = self.parse_ident()?;
            let value = if self.consume_if(&TK::Equals) {
                Some(self.parse_signed_int_lit()?)
            } else {
                None
            };
            let attrs = self.parse_attribute_list()?;
            items.push(Enumerator {
                name: item_name,
                value,
                attrs,
                span: self.close(item_marker),
            });
            if !self.consume_if(&TK::Comma) {
                break;
            }
        }
        self.consume(&TK::RBrace)?;
        self.consume_if(&TK::Semicolon);

        Ok(EnumDecl {
            name,
            items,
            span: self.close(marker),
        })
    }

    fn parse_struct_decl(&mut self) -> Result<StructDecl, ParseError> {
        let marker = self.mark();
        self.consume(&TK::KwStruct)?;
        let name = self.parse_ident()?;
        self.consume(&TK::LBrace)?;

        let mut fields = Vec::new();
        while self.curr_token.kind != TK::RBrace {
            fields.push(self.parse_field()?);
            self.consume(&TK::Semicolon)?;
        }
        self.consume(&TK::RBrace)?;
        self.consume_if(&TK::Semicolon);

        Ok(StructDecl {
            name,
            fields,
            span: self.close(marker),
        })
    }

    /// `<id> ":" Type Name ("=" ConstValue)? AttrList?`, shared by struct
    /// fields, method parameters, and result-tuple fields.
    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let marker = self.mark();
        let id = self.parse_int_lit()?;
        self.consume(&TK::Colon)?;
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        let default_value = if self.consume_if(&TK::Equals) {
            Some(self.parse_const_value()?)
        } else {
            None
        };
        let attrs = self.parse_attribute_list()?;
        Ok(Field {
            id,
            ty,
            name,
            default_value,
            attrs,
            span: self.close(marker),
        })
    }

    fn parse_interface_decl(&mut self) -> Result<InterfaceDecl, ParseError> {
        let marker = self.mark();
        self.consume(&TK::KwInterface)?;
        let name = self.parse_ident()?;
        self.consume(&TK::LBrace)?;

        let mut methods = Vec::new();
        while self.curr_token.kind != TK::RBrace {
            methods.push(self.parse_method()?);
        }
        self.consume(&TK::RBrace)?;
        self.consume_if(&TK::Semicolon);

        Ok(InterfaceDecl {
            name,
            methods,
            span: self.close(marker),
        })
    }

    fn parse_method(&mut self) -> Result<Method, ParseError> {
        let marker = self.mark();
        let kind = match self.curr_token.kind {
            TK::KwRpc => MethodKind::Rpc,
            TK::KwOneway => MethodKind::Oneway,
            TK::KwStream => MethodKind::Stream,
            TK::KwNotify => MethodKind::Notify,
            _ => return Err(ParseError::ExpectedMethod(self.curr_token.clone())),
        };
        self.advance();

        let name = self.parse_ident()?;
        self.consume(&TK::LParen)?;
        let mut params = Vec::new();
        while self.curr_token.kind != TK::RParen {
            params.push(self.parse_field()?);
            if !self.consume_if(&TK::Comma) {
                break;
            }
        }
        self.consume(&TK::RParen)?;

        let result = if self.consume_if(&TK::Arrow) {
            Some(self.parse_method_result()?)
        } else {
            None
        };

        let attrs = self.parse_attribute_list()?;
        self.consume(&TK::Semicolon)?;

        Ok(Method {
            kind,
            name,
            params,
            result,
            attrs,
            span: self.close(marker),
        })
    }

    fn parse_method_result(&mut self) -> Result<MethodResult, ParseError> {
        if self.consume_if(&TK::LParen) {
            let mut fields = vec![self.parse_field()?];
            while self.consume_if(&TK::Comma) {
                fields.push(self.parse_field()?);
            }
            self.consume(&TK::RParen)?;
            Ok(MethodResult::Tuple(fields))
        } else {
            Ok(MethodResult::Single(self.parse_type()?))
        }
    }

    pub(super) fn parse_attribute_list(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attrs = Vec::new();
        if !self.consume_if(&TK::LBracket) {
            return Ok(attrs);
        }

        loop {
            let marker = self.mark();
            let name = self.parse_ident()?;
            let value = if self.consume_if(&TK::Equals) {
                Some(self.parse_const_value()?)
            } else {
                None
            };
            attrs.push(Attribute {
                name,
                value,
                span: self.close(marker),
            });
            if !self.consume_if(&TK::Comma) {
                break;
            }
        }
        self.consume(&TK::RBracket)?;
        Ok(attrs)
    }
}
