use crate::ast::Decl;

use super::{Context, DeclInfo, DeclKind, Pass};

/// Builds the qualified-declaration index and rejects duplicate
/// declarations, including collisions across files that share a module
/// name.
pub struct DeclarationIndexPass;

impl Pass for DeclarationIndexPass {
    fn name(&self) -> &'static str {
        "declaration-index"
    }

    fn run(&self, ctx: &mut Context<'_>) {
        ctx.decl_index_mut().clear();

        let program = ctx.program();
        for (path, file) in &program.files {
            let module_name = file.module.name.to_string();
            for decl in &file.module.decls {
                let kind = match decl {
                    Decl::Struct(_) => DeclKind::Struct,
                    Decl::Enum(_) => DeclKind::Enum,
                    Decl::Interface(_) => DeclKind::Interface,
                    Decl::Const(_) => DeclKind::Const,
                };
                let fq = ctx.qualified_name(&module_name, decl.name());
                if let Some(existing) = ctx.decl_index().get(&fq).cloned() {
                    ctx.report_error(
                        file,
                        decl.span(),
                        format!(
                            "Declaration '{fq}' already defined in {}",
                            existing.file.display()
                        ),
                    );
                    continue;
                }
                ctx.decl_index_mut().insert(
                    fq,
                    DeclInfo {
                        kind,
                        file: path.clone(),
                    },
                );
            }
        }
    }
}
