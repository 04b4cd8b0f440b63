use super::util::check_unique_names;
use super::{Context, Pass};

/// Enumerator names must be unique within each enum.
pub struct EnumValidationPass;

impl Pass for EnumValidationPass {
    fn name(&self) -> &'static str {
        "enum-validation"
    }

    fn run(&self, ctx: &mut Context<'_>) {
        let program = ctx.program();
        for file in program.files.values() {
            for decl in file.module.enums() {
                let owner = format!("enum '{}'", decl.name);
                check_unique_names(ctx, &decl.items, file, &owner, "enumerator");
            }
        }
    }
}
