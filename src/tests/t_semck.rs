use std::path::PathBuf;

use indoc::indoc;

use super::*;
use crate::diag::Severity;
use crate::frontend::{parse_source, Program, SourceFile};

fn program_from(sources: &[(&str, &str)]) -> Program {
    let mut program = Program::new();
    for (name, content) in sources {
        let path = PathBuf::from(name);
        let module = parse_source(content, &path).expect("fixture should parse");
        program.files.insert(
            path.clone(),
            SourceFile {
                path,
                content: content.to_string(),
                module,
            },
        );
    }
    program
}

fn validate_sources(sources: &[(&str, &str)]) -> crate::diag::DiagnosticSink {
    validate(&program_from(sources))
}

fn messages(sink: &crate::diag::DiagnosticSink, severity: Severity) -> Vec<String> {
    sink.diagnostics()
        .iter()
        .filter(|diag| diag.severity == severity)
        .map(|diag| diag.message.clone())
        .collect()
}

#[test]
fn test_clean_interface_passes() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            interface Echo {
                rpc Ping(1: string msg) -> (1: string reply);
            };
        "#},
    )]);
    assert!(sink.diagnostics().is_empty(), "{:?}", sink.diagnostics());
}

#[test]
fn test_duplicate_field_id() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct F { 1: i32 a; 1: i32 b; };
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Duplicate field id '1' in struct 'F'")),
        "{errors:?}"
    );
}

#[test]
fn test_nested_optional_rejected() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct F { 1: optional<optional<i32>> x; };
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Nested optional types are not allowed")),
        "{errors:?}"
    );
}

#[test]
fn test_unknown_type() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct F { 1: Missing x; };
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Unknown type 'Missing'")),
        "{errors:?}"
    );
}

#[test]
fn test_id_gap_is_a_note() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct F { 1: i32 a; 3: i32 b; };
        "#},
    )]);
    assert!(!sink.has_errors());
    let notes = messages(&sink, Severity::Note);
    assert!(
        notes
            .iter()
            .any(|message| message.contains("Gap detected between 1 and 3")),
        "{notes:?}"
    );
}

#[test]
fn test_zero_and_oversized_ids_rejected() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct F { 0: i32 a; 2147483648: i32 b; };
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("ids must start at 1")),
        "{errors:?}"
    );
    assert!(
        errors
            .iter()
            .any(|message| message.contains("maximum allowed value is 2147483647")),
        "{errors:?}"
    );
}

#[test]
fn test_duplicate_module_across_files() {
    let sink = validate_sources(&[
        ("one.hidl", "module sample;"),
        ("two.hidl", "module sample;"),
    ]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Module 'sample' already defined")),
        "{errors:?}"
    );
}

#[test]
fn test_duplicate_declaration_name() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct Thing { 1: i32 a; }
            enum Thing { A, B }
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Declaration 'sample.Thing' already defined")),
        "{errors:?}"
    );
}

#[test]
fn test_cross_module_type_resolution() {
    let sink = validate_sources(&[
        (
            "app.hidl",
            indoc! {r#"
                module app;
                struct Holder { 1: shared.Widget widget; }
            "#},
        ),
        (
            "shared.hidl",
            indoc! {r#"
                module shared;
                struct Widget { 1: u32 id; }
            "#},
        ),
    ]);
    assert!(sink.diagnostics().is_empty(), "{:?}", sink.diagnostics());
}

#[test]
fn test_map_key_must_be_primitive_or_enum() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct Widget { 1: u32 id; }
            enum Color { Red, Green }
            struct Bad { 1: map<Widget, u32> by_widget; }
            struct Fine {
                1: map<Color, u32> by_color;
                2: map<string, u32> by_name;
            }
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("must be a primitive or enum type"));
}

#[test]
fn test_duplicate_method_and_parameter_names() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            interface Files {
                rpc Read(1: string path, 2: u32 path) -> bytes;
                rpc Read() -> bytes;
            };
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Duplicate method name 'Read'")),
        "{errors:?}"
    );
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Duplicate parameter name 'path'")),
        "{errors:?}"
    );
}

#[test]
fn test_result_tuple_ids_checked() {
    let sink = validate_sources(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            interface Calc {
                rpc DivMod(1: i64 a, 2: i64 b) -> (1: i64 quot, 1: i64 rem);
            };
        "#},
    )]);
    let errors = messages(&sink, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|message| message.contains("Duplicate result field id '1'")),
        "{errors:?}"
    );
}

#[test]
fn test_validator_is_idempotent() {
    let program = program_from(&[(
        "sample.hidl",
        indoc! {r#"
            module sample;
            struct F { 1: i32 a; 3: Missing b; };
        "#},
    )]);

    let first = validate(&program);
    let second = validate(&program);

    let render = |sink: &crate::diag::DiagnosticSink| {
        let mut lines: Vec<String> = sink
            .diagnostics()
            .iter()
            .map(|diag| diag.to_string())
            .collect();
        lines.sort();
        lines
    };
    assert_eq!(render(&first), render(&second));
}
