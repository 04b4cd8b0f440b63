use super::type_check::validate_type;
use super::util::{check_id_collection, check_unique_names};
use super::{Context, Pass};

/// Field names, id bounds/uniqueness, gap notes, and field types.
pub struct StructValidationPass;

impl Pass for StructValidationPass {
    fn name(&self) -> &'static str {
        "struct-validation"
    }

    fn run(&self, ctx: &mut Context<'_>) {
        let program = ctx.program();
        for file in program.files.values() {
            let module_name = file.module.name.to_string();
            for decl in file.module.structs() {
                let owner = format!("struct '{}'", decl.name);
                check_unique_names(ctx, &decl.fields, file, &owner, "field");
                check_id_collection(ctx, &decl.fields, file, &owner, "field");
                for field in &decl.fields {
                    let usage = format!(
                        "field '{}' of struct '{}'",
                        field.name, decl.name
                    );
                    validate_type(ctx, &field.ty, file, field.span, &module_name, &usage);
                }
            }
        }
    }
}
