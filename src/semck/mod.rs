//! Multi-pass semantic validation over a parsed [`Program`].
//!
//! Each pass is a stateless object; shared lookup state (module and
//! declaration indexes) lives in the [`Context`] and is built by the first
//! two passes. Validation never stops at the first error; every pass runs
//! to completion so the caller sees all problems at once.

mod context;
mod decl_index;
mod enum_check;
mod interface_check;
mod module_index;
mod struct_check;
mod type_check;
mod util;

pub use context::{Context, DeclInfo, DeclKind};

use crate::diag::DiagnosticSink;
use crate::frontend::Program;

pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Context<'_>);
}

pub struct Validator {
    passes: Vec<Box<dyn Pass>>,
}

impl Validator {
    /// A validator with the default pass pipeline, in order: module index,
    /// declaration index, enum, struct, and interface validation.
    pub fn new() -> Self {
        let mut validator = Validator { passes: Vec::new() };
        validator.register_default_passes();
        validator
    }

    pub fn empty() -> Self {
        Validator { passes: Vec::new() }
    }

    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    fn register_default_passes(&mut self) {
        self.add_pass(Box::new(module_index::ModuleIndexPass));
        self.add_pass(Box::new(decl_index::DeclarationIndexPass));
        self.add_pass(Box::new(enum_check::EnumValidationPass));
        self.add_pass(Box::new(struct_check::StructValidationPass));
        self.add_pass(Box::new(interface_check::InterfaceValidationPass));
    }

    pub fn run(&self, program: &Program, sink: &mut DiagnosticSink) {
        let mut ctx = Context::new(program, sink);
        for pass in &self.passes {
            pass.run(&mut ctx);
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the default pipeline and returns the collected diagnostics.
pub fn validate(program: &Program) -> DiagnosticSink {
    let mut sink = DiagnosticSink::new();
    Validator::new().run(program, &mut sink);
    sink
}

#[cfg(test)]
#[path = "../tests/t_semck.rs"]
mod tests;
