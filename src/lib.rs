//! Hasten: an IDL compiler plus the HB1 RPC runtime its generated
//! bindings run on.
//!
//! The compiler half (`lexer` → `parse` → `frontend` → `semck` → `ir` →
//! `codegen`) turns `.hidl` sources into Rust bindings. The `runtime`
//! half carries the wire codec, frame layer, UNIX-socket transport, and
//! the reactor those bindings talk to.

pub mod ast;
pub mod codegen;
pub mod compile;
pub mod diag;
pub mod frontend;
pub mod ir;
pub mod json_dump;
pub mod lexer;
pub mod parse;
pub mod runtime;
pub mod semck;
