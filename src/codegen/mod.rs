//! Code generation: from a [`CompilationUnit`](crate::ir::CompilationUnit)
//! to Rust binding sources on disk.

pub mod describe;
pub mod emitter;
pub mod file_writer;
pub mod ids;
pub mod rust_types;

pub use describe::{describe_type, WireShape};
pub use emitter::{emit_unit, generate_module, CodegenError, EmittedModule};
pub use file_writer::write_file_if_changed;
pub use ids::{fnv1a64, interface_id, method_id, module_id};
