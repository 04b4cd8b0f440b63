use super::*;
use crate::ast::{PrimitiveKind, QualIdent, Type};

fn primitive(kind: PrimitiveKind) -> Type {
    Type::Primitive(kind)
}

#[test]
fn test_unsigned_and_bool_are_varint() {
    for kind in [
        PrimitiveKind::Bool,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
    ] {
        let shape = describe_type(&primitive(kind));
        assert_eq!(shape.wire_type, WireType::Varint);
        assert_eq!(shape.kind, ValueKind::Unsigned);
        assert!(!shape.optional);
    }
}

#[test]
fn test_signed_are_zigzag() {
    for kind in [
        PrimitiveKind::I8,
        PrimitiveKind::I16,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
    ] {
        let shape = describe_type(&primitive(kind));
        assert_eq!(shape.wire_type, WireType::ZigZagVarint);
        assert_eq!(shape.kind, ValueKind::Signed);
    }
}

#[test]
fn test_floats_are_fixed_raw_bits() {
    let f32_shape = describe_type(&primitive(PrimitiveKind::F32));
    assert_eq!(f32_shape.wire_type, WireType::Fixed32);
    assert_eq!(f32_shape.kind, ValueKind::Unsigned);

    let f64_shape = describe_type(&primitive(PrimitiveKind::F64));
    assert_eq!(f64_shape.wire_type, WireType::Fixed64);
    assert_eq!(f64_shape.kind, ValueKind::Unsigned);
}

#[test]
fn test_string_and_bytes_length_delimited() {
    let string_shape = describe_type(&primitive(PrimitiveKind::String));
    assert_eq!(string_shape.wire_type, WireType::LengthDelimited);
    assert_eq!(string_shape.kind, ValueKind::String);

    let bytes_shape = describe_type(&primitive(PrimitiveKind::Bytes));
    assert_eq!(bytes_shape.wire_type, WireType::LengthDelimited);
    assert_eq!(bytes_shape.kind, ValueKind::Bytes);
}

#[test]
fn test_nested_types_are_embedded_blobs() {
    let user = Type::User(QualIdent::single("Widget"));
    let vector = Type::Vector(Box::new(primitive(PrimitiveKind::U32)));
    let map = Type::Map(
        Box::new(primitive(PrimitiveKind::String)),
        Box::new(primitive(PrimitiveKind::U32)),
    );
    for ty in [user, vector, map] {
        let shape = describe_type(&ty);
        assert_eq!(shape.wire_type, WireType::LengthDelimited);
        assert_eq!(shape.kind, ValueKind::Bytes);
    }
}

#[test]
fn test_optional_wraps_inner_shape() {
    let shape = describe_type(&Type::Optional(Box::new(primitive(PrimitiveKind::I32))));
    assert_eq!(shape.wire_type, WireType::ZigZagVarint);
    assert_eq!(shape.kind, ValueKind::Signed);
    assert!(shape.optional);
}
