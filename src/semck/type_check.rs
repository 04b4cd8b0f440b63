use crate::ast::Type;
use crate::diag::Span;
use crate::frontend::SourceFile;

use super::{Context, DeclKind};

/// Recursive structural checks on a type reference: user types must
/// resolve, map keys must be primitives or enums, and optionals must not
/// nest.
pub fn validate_type(
    ctx: &mut Context<'_>,
    ty: &Type,
    file: &SourceFile,
    span: Span,
    module_name: &str,
    usage: &str,
) {
    match ty {
        Type::Primitive(_) => {}
        Type::User(name) => {
            let _ = ctx.resolve_user_type(name, module_name, file, span, usage);
        }
        Type::Vector(element) => {
            let usage = format!("{usage} (vector element)");
            validate_type(ctx, element, file, span, module_name, &usage);
        }
        Type::Map(key, value) => {
            validate_map_key(ctx, key, file, span, module_name, usage);
            let usage = format!("{usage} (map value)");
            validate_type(ctx, value, file, span, module_name, &usage);
        }
        Type::Optional(inner) => {
            if let Type::Optional(_) = inner.as_ref() {
                ctx.report_error(
                    file,
                    span,
                    format!("Nested optional types are not allowed in {usage}"),
                );
                let usage = format!("{usage} (inner optional)");
                validate_type(ctx, inner, file, span, module_name, &usage);
            } else {
                let usage = format!("{usage} (optional)");
                validate_type(ctx, inner, file, span, module_name, &usage);
            }
        }
    }
}

fn validate_map_key(
    ctx: &mut Context<'_>,
    key: &Type,
    file: &SourceFile,
    span: Span,
    module_name: &str,
    usage: &str,
) {
    match key {
        Type::Primitive(_) => {}
        Type::User(name) => {
            let key_usage = format!("{usage} (map key)");
            if let Some(info) = ctx.resolve_user_type(name, module_name, file, span, &key_usage)
            {
                if info.kind != DeclKind::Enum {
                    ctx.report_error(
                        file,
                        span,
                        format!("Map key in {usage} must be a primitive or enum type"),
                    );
                }
            }
        }
        _ => {
            ctx.report_error(
                file,
                span,
                format!("Map key in {usage} must be a primitive or enum type"),
            );
        }
    }
}
