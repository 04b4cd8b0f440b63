//! Compilation driver: wires the frontend, validator, IR builder, and
//! emitter together behind one options struct.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codegen::{self, CodegenError, EmittedModule};
use crate::diag::DiagnosticSink;
use crate::frontend::{self, FrontendError, Program};
use crate::ir::{self, CompilationUnit};
use crate::semck;

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Root `.hidl` file; imports resolve relative to its directory.
    pub input: PathBuf,
    /// Destination for generated sources. Defaults to the input's
    /// directory.
    pub output_dir: Option<PathBuf>,
    /// Validate only; do not emit.
    pub check_only: bool,
    /// Print the parsed AST of every file as JSON.
    pub dump_ast: bool,
    /// Print the lowered IR.
    pub dump_ir: bool,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    #[error("{}", .0.render())]
    Invalid(DiagnosticSink),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

#[derive(Debug)]
pub struct CompileOutput {
    pub diagnostics: DiagnosticSink,
    pub unit: CompilationUnit,
    pub emitted: Vec<EmittedModule>,
}

/// Parses and validates without generating anything. Returns the sink so
/// callers can render warnings and notes; any error severity fails.
pub fn check(input: &Path) -> Result<(Program, DiagnosticSink), CompileError> {
    let program = frontend::parse_program(input)?;
    let sink = semck::validate(&program);
    if sink.has_errors() {
        return Err(CompileError::Invalid(sink));
    }
    Ok((program, sink))
}

pub fn compile(options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let (program, diagnostics) = check(&options.input)?;

    if options.dump_ast {
        for file in program.files.values() {
            println!("AST ({}):", file.path.display());
            println!("--------------------------------");
            match serde_json::to_string_pretty(&crate::json_dump::module_to_json(&file.module)) {
                Ok(rendered) => println!("{rendered}"),
                Err(err) => println!("<failed to render: {err}>"),
            }
            println!("--------------------------------");
        }
    }

    let unit = ir::build_unit(&program);

    if options.dump_ir {
        println!("IR:");
        println!("--------------------------------");
        println!("{unit:#?}");
        println!("--------------------------------");
    }

    if options.check_only {
        return Ok(CompileOutput {
            diagnostics,
            unit,
            emitted: Vec::new(),
        });
    }

    let out_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => options
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let emitted = codegen::emit_unit(&unit, &out_dir)?;

    Ok(CompileOutput {
        diagnostics,
        unit,
        emitted,
    })
}

#[cfg(test)]
#[path = "tests/t_compile.rs"]
mod tests;
