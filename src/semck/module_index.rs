use super::{Context, Pass};

/// Builds the module-name index and rejects duplicate module definitions.
pub struct ModuleIndexPass;

impl Pass for ModuleIndexPass {
    fn name(&self) -> &'static str {
        "module-index"
    }

    fn run(&self, ctx: &mut Context<'_>) {
        ctx.module_index_mut().clear();

        let program = ctx.program();
        for (path, file) in &program.files {
            let module_name = file.module.name.to_string();
            if let Some(existing) = ctx.module_index().get(&module_name).cloned() {
                ctx.report_error(
                    file,
                    file.module.span,
                    format!(
                        "Module '{module_name}' already defined in {}",
                        existing.display()
                    ),
                );
                continue;
            }
            ctx.module_index_mut()
                .insert(module_name, path.clone());
        }
    }
}
