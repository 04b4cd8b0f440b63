//! Program-level frontend: reads a root `.hidl` file and resolves its
//! import closure into a [`Program`].
//!
//! Import paths are resolved relative to the root file's directory. A path
//! that has already been parsed is skipped, which also terminates import
//! cycles without any extra bookkeeping.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::ast::Module;
use crate::lexer::{LexError, Lexer, Token};
use crate::parse::{ParseError, Parser};

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
    pub module: Module,
}

/// All parsed files of one compilation, keyed by path in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub files: IndexMap<PathBuf, SourceFile>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),

    #[error("{}: {}", .path.display(), .error)]
    Lex {
        path: PathBuf,
        #[source]
        error: LexError,
    },

    #[error("{}: {}", .path.display(), .error)]
    Parse {
        path: PathBuf,
        #[source]
        error: ParseError,
    },

    #[error("duplicate root file: {}", .0.display())]
    DuplicateRoot(PathBuf),
}

impl FrontendError {
    fn lex(path: &Path, error: LexError) -> Self {
        FrontendError::Lex {
            path: path.to_path_buf(),
            error,
        }
    }

    fn parse(path: &Path, error: ParseError) -> Self {
        FrontendError::Parse {
            path: path.to_path_buf(),
            error,
        }
    }
}

/// Parses the root file and the transitive closure of its imports.
pub fn parse_program(root: &Path) -> Result<Program, FrontendError> {
    let mut program = Program::new();
    add_root(&mut program, root)?;
    Ok(program)
}

/// Adds another root file (and its imports) to an existing program.
/// Re-adding a path that is already present is an error; imports that were
/// already parsed are silently skipped.
pub fn add_root(program: &mut Program, root: &Path) -> Result<(), FrontendError> {
    if program.files.contains_key(root) {
        return Err(FrontendError::DuplicateRoot(root.to_path_buf()));
    }
    let base_dir = root.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
    parse_with_imports(program, root, &base_dir)
}

fn parse_with_imports(
    program: &mut Program,
    path: &Path,
    base_dir: &Path,
) -> Result<(), FrontendError> {
    let source_file = parse_single_file(path)?;
    let imports: Vec<String> = source_file
        .module
        .imports
        .iter()
        .map(|import| import.path.clone())
        .collect();
    program.files.insert(path.to_path_buf(), source_file);

    for import in imports {
        let import_path = base_dir.join(&import);
        if program.files.contains_key(&import_path) {
            continue;
        }
        parse_with_imports(program, &import_path, base_dir)?;
    }
    Ok(())
}

/// Reads and parses one file without touching its imports.
pub fn parse_single_file(path: &Path) -> Result<SourceFile, FrontendError> {
    let content = std::fs::read_to_string(path)
        .map_err(|error| FrontendError::Io(path.to_path_buf(), error))?;
    let module = parse_source(&content, path)?;
    Ok(SourceFile {
        path: path.to_path_buf(),
        content,
        module,
    })
}

/// Parses module source text that is already in memory.
pub fn parse_source(content: &str, path: &Path) -> Result<Module, FrontendError> {
    let lexer = Lexer::new(content);
    let tokens = lexer
        .tokenize()
        .collect::<Result<Vec<Token>, LexError>>()
        .map_err(|error| FrontendError::lex(path, error))?;

    let mut parser = Parser::new(&tokens);
    parser
        .parse()
        .map_err(|error| FrontendError::parse(path, error))
}

#[cfg(test)]
#[path = "../tests/t_frontend.rs"]
mod tests;
