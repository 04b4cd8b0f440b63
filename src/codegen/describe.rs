//! Maps IDL types to their wire shape, used to build the generated
//! `FieldDescriptor` tables.

use crate::ast::{PrimitiveKind, Type};
use crate::runtime::hb1::{ValueKind, WireType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireShape {
    pub wire_type: WireType,
    pub kind: ValueKind,
    pub optional: bool,
}

/// The wire encoding for one field of the given IDL type. `optional<T>`
/// yields `T`'s shape flagged optional; a missing optional field is
/// absence on the wire, not a sentinel.
pub fn describe_type(ty: &Type) -> WireShape {
    match ty {
        Type::Primitive(kind) => match kind {
            PrimitiveKind::Bool
            | PrimitiveKind::U8
            | PrimitiveKind::U16
            | PrimitiveKind::U32
            | PrimitiveKind::U64 => WireShape {
                wire_type: WireType::Varint,
                kind: ValueKind::Unsigned,
                optional: false,
            },
            PrimitiveKind::I8
            | PrimitiveKind::I16
            | PrimitiveKind::I32
            | PrimitiveKind::I64 => WireShape {
                wire_type: WireType::ZigZagVarint,
                kind: ValueKind::Signed,
                optional: false,
            },
            PrimitiveKind::F32 => WireShape {
                wire_type: WireType::Fixed32,
                kind: ValueKind::Unsigned,
                optional: false,
            },
            PrimitiveKind::F64 => WireShape {
                wire_type: WireType::Fixed64,
                kind: ValueKind::Unsigned,
                optional: false,
            },
            PrimitiveKind::String => WireShape {
                wire_type: WireType::LengthDelimited,
                kind: ValueKind::String,
                optional: false,
            },
            PrimitiveKind::Bytes => WireShape {
                wire_type: WireType::LengthDelimited,
                kind: ValueKind::Bytes,
                optional: false,
            },
        },
        // Nested types travel as an embedded length-delimited blob.
        Type::User(_) | Type::Vector(_) | Type::Map(_, _) => WireShape {
            wire_type: WireType::LengthDelimited,
            kind: ValueKind::Bytes,
            optional: false,
        },
        Type::Optional(inner) => {
            let mut shape = describe_type(inner);
            shape.optional = true;
            shape
        }
    }
}

#[cfg(test)]
#[path = "../tests/t_describe.rs"]
mod tests;
