use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use indoc::indoc;

use super::*;

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempTree {
    root: PathBuf,
}

impl TempTree {
    fn new(name: &str) -> Self {
        let run_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "hasten_compile_{name}_{}_{run_id}",
            std::process::id()
        ));
        std::fs::create_dir_all(&root).expect("failed to create temp dir");
        TempTree { root }
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        std::fs::write(&path, content).expect("failed to write file");
        path
    }
}

impl Drop for TempTree {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

#[test]
fn test_check_only_emits_nothing() {
    let tree = TempTree::new("check_only");
    let input = tree.write(
        "main.hidl",
        indoc! {r#"
            module sample;
            interface Echo {
                rpc Ping(1: string msg) -> (1: string reply);
            };
        "#},
    );

    let options = CompileOptions {
        input,
        check_only: true,
        ..CompileOptions::default()
    };
    let output = compile(&options).expect("check should pass");
    assert!(output.emitted.is_empty());
    assert_eq!(output.unit.modules.len(), 1);
}

#[test]
fn test_compile_emits_bindings() {
    let tree = TempTree::new("emit");
    let input = tree.write(
        "main.hidl",
        indoc! {r#"
            module sample;
            struct Payload { 1: string message; }
        "#},
    );

    let options = CompileOptions {
        input,
        output_dir: Some(tree.root.join("gen")),
        ..CompileOptions::default()
    };
    let output = compile(&options).expect("compile should pass");
    assert_eq!(output.emitted.len(), 1);
    let content = std::fs::read_to_string(&output.emitted[0].path)
        .expect("generated file should exist");
    assert!(content.contains("pub struct Payload"));
}

#[test]
fn test_semantic_errors_fail_compile() {
    let tree = TempTree::new("invalid");
    let input = tree.write(
        "main.hidl",
        indoc! {r#"
            module sample;
            struct F { 1: Missing x; };
        "#},
    );

    let options = CompileOptions {
        input,
        ..CompileOptions::default()
    };
    let err = compile(&options).expect_err("unknown type should fail");
    match err {
        CompileError::Invalid(sink) => {
            assert!(sink.has_errors());
            assert!(sink.render().contains("Unknown type 'Missing'"));
        }
        other => panic!("Expected diagnostics failure, got {other}"),
    }
}

#[test]
fn test_missing_input_is_frontend_error() {
    let options = CompileOptions {
        input: PathBuf::from("/nonexistent/input.hidl"),
        ..CompileOptions::default()
    };
    let err = compile(&options).expect_err("missing input should fail");
    assert!(matches!(err, CompileError::Frontend(_)));
}

#[test]
fn test_notes_survive_successful_compile() {
    let tree = TempTree::new("notes");
    let input = tree.write(
        "main.hidl",
        indoc! {r#"
            module sample;
            struct F { 1: i32 a; 3: i32 b; };
        "#},
    );

    let options = CompileOptions {
        input,
        check_only: true,
        ..CompileOptions::default()
    };
    let output = compile(&options).expect("notes are not failures");
    assert!(output
        .diagnostics
        .render()
        .contains("Gap detected between 1 and 3"));
}
