//! Debug JSON rendering of a parsed module, behind `--dump ast`.

use serde_json::{json, Value as Json};

use crate::ast::{
    Attribute, ConstValue, Decl, Field, Method, MethodResult, Module, Type,
};

pub fn module_to_json(module: &Module) -> Json {
    json!({
        "module": module.name.to_string(),
        "imports": module.imports.iter().map(|import| import.path.clone()).collect::<Vec<_>>(),
        "declarations": module.decls.iter().map(decl_to_json).collect::<Vec<_>>(),
    })
}

fn decl_to_json(decl: &Decl) -> Json {
    match decl {
        Decl::Const(decl) => json!({
            "kind": "const",
            "name": decl.name,
            "type": type_to_json(&decl.ty),
            "value": const_to_json(&decl.value),
        }),
        Decl::Enum(decl) => json!({
            "kind": "enum",
            "name": decl.name,
            "items": decl.items.iter().map(|item| json!({
                "name": item.name,
                "value": item.value,
                "attributes": attrs_to_json(&item.attrs),
            })).collect::<Vec<_>>(),
        }),
        Decl::Struct(decl) => json!({
            "kind": "struct",
            "name": decl.name,
            "fields": decl.fields.iter().map(field_to_json).collect::<Vec<_>>(),
        }),
        Decl::Interface(decl) => json!({
            "kind": "interface",
            "name": decl.name,
            "methods": decl.methods.iter().map(method_to_json).collect::<Vec<_>>(),
        }),
    }
}

fn field_to_json(field: &Field) -> Json {
    json!({
        "id": field.id,
        "name": field.name,
        "type": type_to_json(&field.ty),
        "default": field.default_value.as_ref().map(const_to_json),
        "attributes": attrs_to_json(&field.attrs),
    })
}

fn method_to_json(method: &Method) -> Json {
    let result = match &method.result {
        None => Json::Null,
        Some(MethodResult::Single(ty)) => type_to_json(ty),
        Some(MethodResult::Tuple(fields)) => {
            json!(fields.iter().map(field_to_json).collect::<Vec<_>>())
        }
    };
    json!({
        "kind": method.kind.to_string(),
        "name": method.name,
        "parameters": method.params.iter().map(field_to_json).collect::<Vec<_>>(),
        "result": result,
        "attributes": attrs_to_json(&method.attrs),
    })
}

fn attrs_to_json(attrs: &[Attribute]) -> Json {
    json!(attrs
        .iter()
        .map(|attr| json!({
            "name": attr.name,
            "value": attr.value.as_ref().map(const_to_json),
        }))
        .collect::<Vec<_>>())
}

fn type_to_json(ty: &Type) -> Json {
    Json::String(ty.to_string())
}

fn const_to_json(value: &ConstValue) -> Json {
    match value {
        ConstValue::Null => Json::Null,
        ConstValue::Bool(v) => json!(v),
        ConstValue::Int(v) => json!(v),
        ConstValue::Float(v) => json!(v),
        ConstValue::Str(v) => json!(v),
        ConstValue::Bytes(v) => json!(v
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>()),
        ConstValue::Symbol(name) => json!({ "symbol": name.to_string() }),
    }
}
