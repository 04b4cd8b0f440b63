use crate::ast::MethodResult;

use super::type_check::validate_type;
use super::util::{check_id_collection, check_unique_names};
use super::{Context, Pass};

/// Method names; per-method parameter and result-tuple names, ids, and
/// types.
pub struct InterfaceValidationPass;

impl Pass for InterfaceValidationPass {
    fn name(&self) -> &'static str {
        "interface-validation"
    }

    fn run(&self, ctx: &mut Context<'_>) {
        let program = ctx.program();
        for file in program.files.values() {
            let module_name = file.module.name.to_string();
            for iface in file.module.interfaces() {
                let interface_owner = format!("interface '{}'", iface.name);
                check_unique_names(ctx, &iface.methods, file, &interface_owner, "method");

                for method in &iface.methods {
                    let method_owner = format!("method '{}'", method.name);
                    check_unique_names(ctx, &method.params, file, &method_owner, "parameter");
                    check_id_collection(ctx, &method.params, file, &method_owner, "parameter");
                    for param in &method.params {
                        let usage = format!(
                            "parameter '{}' of method '{}'",
                            param.name, method.name
                        );
                        validate_type(ctx, &param.ty, file, param.span, &module_name, &usage);
                    }

                    match &method.result {
                        Some(MethodResult::Tuple(fields)) => {
                            let result_owner = format!("{method_owner} result");
                            check_unique_names(ctx, fields, file, &result_owner, "field");
                            check_id_collection(
                                ctx,
                                fields,
                                file,
                                &method_owner,
                                "result field",
                            );
                            for field in fields {
                                let usage = format!(
                                    "result field '{}' of method '{}'",
                                    field.name, method.name
                                );
                                validate_type(
                                    ctx, &field.ty, file, field.span, &module_name, &usage,
                                );
                            }
                        }
                        Some(MethodResult::Single(ty)) => {
                            let usage = format!("result of method '{}'", method.name);
                            validate_type(ctx, ty, file, method.span, &module_name, &usage);
                        }
                        None => {}
                    }
                }
            }
        }
    }
}
