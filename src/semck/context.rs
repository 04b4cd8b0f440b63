use std::collections::HashMap;
use std::path::PathBuf;

use crate::ast::QualIdent;
use crate::diag::{DiagnosticSink, Severity, SourceLocation, Span};
use crate::frontend::{Program, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Struct,
    Enum,
    Interface,
    Const,
}

#[derive(Debug, Clone)]
pub struct DeclInfo {
    pub kind: DeclKind,
    pub file: PathBuf,
}

/// Shared state threaded through validator passes: the program under
/// validation, the sink, and the indexes built by the early passes.
pub struct Context<'a> {
    program: &'a Program,
    sink: &'a mut DiagnosticSink,
    module_index: HashMap<String, PathBuf>,
    decl_index: HashMap<String, DeclInfo>,
}

impl<'a> Context<'a> {
    pub fn new(program: &'a Program, sink: &'a mut DiagnosticSink) -> Self {
        Context {
            program,
            sink,
            module_index: HashMap::new(),
            decl_index: HashMap::new(),
        }
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn module_index(&self) -> &HashMap<String, PathBuf> {
        &self.module_index
    }

    pub fn module_index_mut(&mut self) -> &mut HashMap<String, PathBuf> {
        &mut self.module_index
    }

    pub fn decl_index(&self) -> &HashMap<String, DeclInfo> {
        &self.decl_index
    }

    pub fn decl_index_mut(&mut self) -> &mut HashMap<String, DeclInfo> {
        &mut self.decl_index
    }

    pub fn qualified_name(&self, module_name: &str, decl_name: &str) -> String {
        if module_name.is_empty() {
            decl_name.to_string()
        } else {
            format!("{module_name}.{decl_name}")
        }
    }

    /// Resolves a user type reference: exact qualified name first, then
    /// `<current module>.<name>` for single-part names. Reports an error
    /// and returns `None` when unresolved.
    pub fn resolve_user_type(
        &mut self,
        name: &QualIdent,
        module_name: &str,
        file: &SourceFile,
        span: Span,
        usage: &str,
    ) -> Option<DeclInfo> {
        let text = name.to_string();
        if let Some(info) = self.decl_index.get(&text) {
            return Some(info.clone());
        }
        if name.is_single() {
            let fq = self.qualified_name(module_name, &text);
            if let Some(info) = self.decl_index.get(&fq) {
                return Some(info.clone());
            }
        }
        self.report_error(
            file,
            span,
            format!("Unknown type '{text}' referenced in {usage}"),
        );
        None
    }

    fn report(&mut self, severity: Severity, file: &SourceFile, span: Span, message: String) {
        let location = SourceLocation {
            path: file.path.clone(),
            line: span.start.line,
            column: span.start.column,
        };
        self.sink.report(severity, location, message);
    }

    pub fn report_error(&mut self, file: &SourceFile, span: Span, message: String) {
        self.report(Severity::Error, file, span, message);
    }

    pub fn report_warning(&mut self, file: &SourceFile, span: Span, message: String) {
        self.report(Severity::Warning, file, span, message);
    }

    pub fn report_note(&mut self, file: &SourceFile, span: Span, message: String) {
        self.report(Severity::Note, file, span, message);
    }
}
