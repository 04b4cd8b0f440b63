use indoc::indoc;

use super::*;
use crate::ast::{ConstValue, Decl, MethodKind, MethodResult, PrimitiveKind, Type};
use crate::lexer::{LexError, Lexer, Token};

fn parse_module(source: &str) -> Result<Module, ParseError> {
    let tokens = Lexer::new(source)
        .tokenize()
        .collect::<Result<Vec<Token>, LexError>>()
        .expect("Failed to tokenize");

    let mut parser = Parser::new(&tokens);
    parser.parse()
}

fn parse_ok(source: &str) -> Module {
    parse_module(source).expect("Failed to parse")
}

#[test]
fn test_parse_module_header_and_imports() {
    let module = parse_ok(indoc! {r#"
        module sample.core;
        import "types.hidl";
        import "deep/nested.hidl";
    "#});

    assert_eq!(module.name.to_string(), "sample.core");
    assert_eq!(
        module
            .imports
            .iter()
            .map(|import| import.path.as_str())
            .collect::<Vec<_>>(),
        vec!["types.hidl", "deep/nested.hidl"]
    );
    assert!(module.decls.is_empty());
}

#[test]
fn test_parse_struct_with_fields() {
    let module = parse_ok(indoc! {r#"
        module sample;
        struct Point {
            1: i32 x;
            2: i32 y;
            3: optional<string> label;
        };
    "#});

    let decl = match &module.decls[0] {
        Decl::Struct(decl) => decl,
        other => panic!("Expected struct, got {other:?}"),
    };
    assert_eq!(decl.name, "Point");
    assert_eq!(decl.fields.len(), 3);
    assert_eq!(decl.fields[0].id, 1);
    assert_eq!(decl.fields[0].ty, Type::Primitive(PrimitiveKind::I32));
    assert_eq!(
        decl.fields[2].ty,
        Type::Optional(Box::new(Type::Primitive(PrimitiveKind::String)))
    );
}

#[test]
fn test_parse_field_default_and_attributes() {
    let module = parse_ok(indoc! {r#"
        module sample;
        struct Config {
            1: u32 retries = 3 [deprecated, since = "1.2"];
        }
    "#});

    let decl = match &module.decls[0] {
        Decl::Struct(decl) => decl,
        other => panic!("Expected struct, got {other:?}"),
    };
    let field = &decl.fields[0];
    assert_eq!(field.default_value, Some(ConstValue::Int(3)));
    assert_eq!(field.attrs.len(), 2);
    assert_eq!(field.attrs[0].name, "deprecated");
    assert_eq!(field.attrs[0].value, None);
    assert_eq!(
        field.attrs[1].value,
        Some(ConstValue::Str("1.2".to_string()))
    );
}

#[test]
fn test_parse_enum_with_values_and_trailing_comma() {
    let module = parse_ok(indoc! {r#"
        module sample;
        enum Color {
            Red,
            Green = 5,
            Blue,
        };
    "#});

    let decl = match &module.decls[0] {
        Decl::Enum(decl) => decl,
        other => panic!("Expected enum, got {other:?}"),
    };
    assert_eq!(decl.items.len(), 3);
    assert_eq!(decl.items[0].value, None);
    assert_eq!(decl.items[1].value, Some(5));
}

#[test]
fn test_parse_const_declarations() {
    let module = parse_ok(indoc! {r#"
        module sample;
        const i32 MAX_RETRIES = 5;
        const string GREETING = "hello";
        const f64 RATIO = -0.5;
        const bytes MAGIC = b"cafe";
        const Color DEFAULT_COLOR = Color.Red;
    "#});

    let consts: Vec<_> = module.consts().collect();
    assert_eq!(consts.len(), 5);
    assert_eq!(consts[0].value, ConstValue::Int(5));
    assert_eq!(consts[1].value, ConstValue::Str("hello".to_string()));
    assert_eq!(consts[2].value, ConstValue::Float(-0.5));
    assert_eq!(consts[3].value, ConstValue::Bytes(vec![0xca, 0xfe]));
    match &consts[4].value {
        ConstValue::Symbol(name) => assert_eq!(name.to_string(), "Color.Red"),
        other => panic!("Expected symbol, got {other:?}"),
    }
}

#[test]
fn test_parse_interface_methods() {
    let module = parse_ok(indoc! {r#"
        module sample;
        interface Echo {
            rpc Ping(1: string msg) -> (1: string reply);
            oneway Fire(1: u64 token);
            rpc Stat() -> u64;
            notify Changed();
        };
    "#});

    let iface = match &module.decls[0] {
        Decl::Interface(decl) => decl,
        other => panic!("Expected interface, got {other:?}"),
    };
    assert_eq!(iface.methods.len(), 4);

    let ping = &iface.methods[0];
    assert_eq!(ping.kind, MethodKind::Rpc);
    assert_eq!(ping.params.len(), 1);
    assert_eq!(ping.params[0].id, 1);
    match &ping.result {
        Some(MethodResult::Tuple(fields)) => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].name, "reply");
        }
        other => panic!("Expected tuple result, got {other:?}"),
    }

    assert_eq!(iface.methods[1].kind, MethodKind::Oneway);
    assert!(iface.methods[1].result.is_none());

    match &iface.methods[2].result {
        Some(MethodResult::Single(Type::Primitive(PrimitiveKind::U64))) => {}
        other => panic!("Expected single u64 result, got {other:?}"),
    }

    assert_eq!(iface.methods[3].kind, MethodKind::Notify);
    assert!(iface.methods[3].params.is_empty());
}

#[test]
fn test_parse_nested_container_types() {
    let module = parse_ok(indoc! {r#"
        module sample;
        struct Catalog {
            1: vector<map<string, vector<i64>>> shelves;
        }
    "#});

    let decl = match &module.decls[0] {
        Decl::Struct(decl) => decl,
        other => panic!("Expected struct, got {other:?}"),
    };
    let expected = Type::Vector(Box::new(Type::Map(
        Box::new(Type::Primitive(PrimitiveKind::String)),
        Box::new(Type::Vector(Box::new(Type::Primitive(PrimitiveKind::I64)))),
    )));
    assert_eq!(decl.fields[0].ty, expected);
}

#[test]
fn test_parse_qualified_user_type() {
    let module = parse_ok(indoc! {r#"
        module sample;
        struct Holder {
            1: other.types.Widget widget;
        }
    "#});

    let decl = match &module.decls[0] {
        Decl::Struct(decl) => decl,
        other => panic!("Expected struct, got {other:?}"),
    };
    match &decl.fields[0].ty {
        Type::User(name) => assert_eq!(name.to_string(), "other.types.Widget"),
        other => panic!("Expected user type, got {other:?}"),
    }
}

#[test]
fn test_parse_error_reports_expected_token() {
    let result = parse_module("module sample\nstruct Broken {}");
    let error = result.expect_err("missing semicolon should fail");
    assert!(matches!(error, ParseError::ExpectedToken(_, _)));
    assert_eq!(error.span().start.line, 2);
}

#[test]
fn test_parse_missing_module_header_fails() {
    let result = parse_module("struct Foo {}");
    assert!(result.is_err());
}

#[test]
fn test_parse_method_attributes() {
    let module = parse_ok(indoc! {r#"
        module sample;
        interface Files {
            rpc Read(1: string path) -> bytes [timeout = 30];
        }
    "#});

    let iface = match &module.decls[0] {
        Decl::Interface(decl) => decl,
        other => panic!("Expected interface, got {other:?}"),
    };
    let method = &iface.methods[0];
    assert_eq!(method.attrs.len(), 1);
    assert_eq!(method.attrs[0].name, "timeout");
    assert_eq!(method.attrs[0].value, Some(ConstValue::Int(30)));
}
