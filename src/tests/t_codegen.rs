use std::path::PathBuf;

use indoc::indoc;

use super::*;
use crate::frontend::{parse_source, Program, SourceFile};
use crate::ir;

fn unit_from(source: &str) -> ir::CompilationUnit {
    let path = PathBuf::from("sample.hidl");
    let module = parse_source(source, &path).expect("fixture should parse");
    let mut program = Program::new();
    program.files.insert(
        path.clone(),
        SourceFile {
            path,
            content: source.to_string(),
            module,
        },
    );
    ir::build_unit(&program)
}

fn generate(source: &str) -> String {
    let unit = unit_from(source);
    let table = TypeTable::build(&unit);
    generate_module(&unit.modules[0], &table)
}

const ECHO_IDL: &str = indoc! {r#"
    module sample.core;
    struct Payload {
        1: string message;
    }
    interface Echo {
        rpc Ping(1: Payload payload) -> (1: Payload reply);
    };
"#};

#[test]
fn test_struct_type_and_descriptor() {
    let generated = generate(ECHO_IDL);

    assert!(generated.contains("pub struct Payload {"));
    assert!(generated.contains("pub message: String, // field id: 1"));
    assert!(generated.contains("pub const PAYLOAD_DESCRIPTOR: MessageDescriptor<'static>"));
    assert!(generated.contains(
        "FieldDescriptor { id: 1, wire_type: WireType::LengthDelimited, optional: false, \
         preferred_kind: ValueKind::String }"
    ));
}

#[test]
fn test_stable_identifiers_embedded() {
    let generated = generate(ECHO_IDL);

    let module_id = ids::module_id("sample.core");
    let interface_id = ids::interface_id("sample.core", "Echo");
    let method_id = ids::method_id("sample.core", "Echo", "Ping");

    assert!(generated.contains(&format!("pub const MODULE_ID: u64 = {module_id:#018x};")));
    assert!(generated.contains(&format!(
        "pub const ECHO_INTERFACE_ID: u64 = {interface_id:#018x};"
    )));
    assert!(generated.contains(&format!(
        "pub const ECHO_PING_METHOD_ID: u64 = {method_id:#018x};"
    )));
}

#[test]
fn test_result_record_for_tuple_results() {
    let generated = generate(ECHO_IDL);
    assert!(generated.contains("pub struct EchoPingResult {"));
    assert!(generated.contains("pub reply: Payload, // field id: 1"));
}

#[test]
fn test_client_stub_shapes() {
    let generated = generate(ECHO_IDL);

    assert!(generated.contains("pub struct EchoClient {"));
    assert!(generated.contains("pub fn ping("));
    assert!(generated.contains("callback: impl FnOnce(Result<EchoPingResult>) + Send + 'static"));
    assert!(generated.contains("pub fn ping_async(&self, payload: &Payload) -> PendingReply<EchoPingResult>"));
    assert!(generated.contains("pub fn ping_sync(&self, payload: &Payload) -> Result<EchoPingResult>"));
    assert!(generated.contains("pub fn make_echo_client("));
}

#[test]
fn test_server_trait_and_bind() {
    let generated = generate(ECHO_IDL);

    assert!(generated.contains("pub trait Echo: Send + Sync {"));
    assert!(generated.contains("fn ping(&self, payload: &Payload) -> Result<EchoPingResult>;"));
    // bind registers in the process-wide registry; the dispatcher is a
    // client-path detail and takes no part here.
    assert!(generated
        .contains("pub fn bind_echo(implementation: Arc<dyn Echo>, executor: Arc<dyn Executor>)"));
    assert!(generated.contains("rpc::register_handler(ECHO_INTERFACE_ID, handler);"));
    assert!(generated.contains("executor.schedule(Box::new(move || {"));
}

#[test]
fn test_dispatch_covers_status_codes() {
    let generated = generate(ECHO_IDL);

    assert!(generated.contains("Response::status_only(Status::InvalidRequest)"));
    assert!(generated.contains("Response::status_only(Status::ApplicationError)"));
    assert!(generated.contains("Response::status_only(Status::InternalError)"));
    assert!(generated.contains("Response::status_only(Status::NotFound)"));
}

#[test]
fn test_enum_generation_preserves_values() {
    let generated = generate(indoc! {r#"
        module sample;
        enum Color { Red, Green = 5, Blue }
    "#});

    assert!(generated.contains("pub enum Color {"));
    assert!(generated.contains("Red = 0,"));
    assert!(generated.contains("Green = 5,"));
    assert!(generated.contains("Blue = 6,"));
    assert!(generated.contains("5 => Some(Color::Green),"));
}

#[test]
fn test_scalar_params_passed_by_value() {
    let generated = generate(indoc! {r#"
        module sample;
        interface Calc {
            rpc Add(1: i64 a, 2: i64 b) -> i64;
        };
    "#});

    assert!(generated.contains("fn add(&self, a: i64, b: i64) -> Result<i64>;"));
}

#[test]
fn test_optional_field_encodes_on_presence_only() {
    let generated = generate(indoc! {r#"
        module sample;
        struct Form {
            1: optional<string> note;
        }
    "#});

    assert!(generated.contains("if let Some(present) = &value.note {"));
    assert!(generated.contains(
        "FieldDescriptor { id: 1, wire_type: WireType::LengthDelimited, optional: true, \
         preferred_kind: ValueKind::String }"
    ));
}

#[test]
fn test_cross_module_types_use_super_paths() {
    let unit = unit_from_files(&[
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
    let table = TypeTable::build(&unit);
    let app = unit
        .modules
        .iter()
        .find(|module| module.name == "app")
        .expect("app module should exist");
    let generated = generate_module(app, &table);

    assert!(generated.contains("pub widget: super::shared::Widget, // field id: 1"));
    assert!(generated.contains("super::shared::encode_widget(&value.widget, &mut blob)?;"));
}

fn unit_from_files(sources: &[(&str, &str)]) -> ir::CompilationUnit {
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
    ir::build_unit(&program)
}

#[test]
fn test_generation_is_deterministic() {
    assert_eq!(generate(ECHO_IDL), generate(ECHO_IDL));
}

#[test]
fn test_emit_unit_writes_if_changed_only() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

    let run_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let out_dir = std::env::temp_dir().join(format!(
        "hasten_codegen_{}_{run_id}",
        std::process::id()
    ));

    let unit = unit_from(ECHO_IDL);

    let first = emit_unit(&unit, &out_dir).expect("emission should succeed");
    assert_eq!(first.len(), 1);
    assert!(first[0].written);
    assert!(first[0].path.ends_with("sample/core/sample_core.gen.rs"));

    let second = emit_unit(&unit, &out_dir).expect("re-emission should succeed");
    assert!(!second[0].written, "unchanged content must not be rewritten");

    let _ = std::fs::remove_dir_all(&out_dir);
}
