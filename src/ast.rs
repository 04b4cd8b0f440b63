//! Abstract syntax tree for `.hidl` modules.
//!
//! Every node carries the source span it was parsed from so diagnostics can
//! point at `file:line:column`. Recursive types (`vector`, `map`,
//! `optional`) box their element types to keep the sum bounded.

use std::fmt::{self, Display, Formatter};

use crate::diag::Span;

// -- Identifiers --

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualIdent {
    pub parts: Vec<String>,
}

impl QualIdent {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    pub fn single(part: impl Into<String>) -> Self {
        Self {
            parts: vec![part.into()],
        }
    }

    pub fn is_single(&self) -> bool {
        self.parts.len() == 1
    }
}

impl Display for QualIdent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

// -- Constant values --

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Symbolic reference to another declaration, e.g. `colors.Red`.
    Symbol(QualIdent),
}

// -- Types --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimitiveKind),
    User(QualIdent),
    Vector(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Optional(Box<Type>),
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => f.write_str(kind.name()),
            Type::User(name) => write!(f, "{name}"),
            Type::Vector(element) => write!(f, "vector<{element}>"),
            Type::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Type::Optional(inner) => write!(f, "optional<{inner}>"),
        }
    }
}

// -- Attributes --

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<ConstValue>,
    pub span: Span,
}

// -- Fields / parameters --

/// A numbered struct field, method parameter, or result-tuple field. The
/// `id` is the wire-level tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: u64,
    pub ty: Type,
    pub name: String,
    pub default_value: Option<ConstValue>,
    pub attrs: Vec<Attribute>,
    pub span: Span,
}

// -- Declarations --

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub ty: Type,
    pub name: String,
    pub value: ConstValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<i64>,
    pub attrs: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub items: Vec<Enumerator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Rpc,
    Oneway,
    Stream,
    Notify,
}

impl Display for MethodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            MethodKind::Rpc => "rpc",
            MethodKind::Oneway => "oneway",
            MethodKind::Stream => "stream",
            MethodKind::Notify => "notify",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    Single(Type),
    Tuple(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub kind: MethodKind,
    pub name: String,
    pub params: Vec<Field>,
    pub result: Option<MethodResult>,
    pub attrs: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub methods: Vec<Method>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Const(ConstDecl),
    Enum(EnumDecl),
    Struct(StructDecl),
    Interface(InterfaceDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Const(decl) => &decl.name,
            Decl::Enum(decl) => &decl.name,
            Decl::Struct(decl) => &decl.name,
            Decl::Interface(decl) => &decl.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Const(decl) => decl.span,
            Decl::Enum(decl) => decl.span,
            Decl::Struct(decl) => decl.span,
            Decl::Interface(decl) => decl.span,
        }
    }
}

// -- Module --

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: QualIdent,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl Module {
    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Enum(e) => Some(e),
            _ => None,
        })
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Interface(i) => Some(i),
            _ => None,
        })
    }

    pub fn consts(&self) -> impl Iterator<Item = &ConstDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Const(c) => Some(c),
            _ => None,
        })
    }
}
