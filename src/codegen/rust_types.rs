//! IDL type → Rust type mapping and the cross-module type table the
//! emitter resolves user types against.

use std::collections::HashMap;

use crate::ast::{PrimitiveKind, QualIdent, Type};
use crate::ir::CompilationUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserTypeKind {
    Struct,
    Enum,
}

#[derive(Debug, Clone)]
pub struct UserTypeInfo {
    pub kind: UserTypeKind,
    pub module_name: String,
    pub module_base: String,
    pub decl_name: String,
}

/// Unit-wide lookup of every struct and enum by qualified name.
#[derive(Debug, Default)]
pub struct TypeTable {
    entries: HashMap<String, UserTypeInfo>,
}

pub fn module_base_name(namespace_parts: &[String], module_name: &str) -> String {
    if namespace_parts.is_empty() {
        module_name.to_string()
    } else {
        namespace_parts.join("_")
    }
}

impl TypeTable {
    pub fn build(unit: &CompilationUnit) -> Self {
        let mut entries = HashMap::new();
        for module in &unit.modules {
            let base = module_base_name(&module.namespace_parts, &module.name);
            for decl in &module.structs {
                entries.insert(
                    format!("{}.{}", module.name, decl.name),
                    UserTypeInfo {
                        kind: UserTypeKind::Struct,
                        module_name: module.name.clone(),
                        module_base: base.clone(),
                        decl_name: decl.name.clone(),
                    },
                );
            }
            for decl in &module.enums {
                entries.insert(
                    format!("{}.{}", module.name, decl.name),
                    UserTypeInfo {
                        kind: UserTypeKind::Enum,
                        module_name: module.name.clone(),
                        module_base: base.clone(),
                        decl_name: decl.name.clone(),
                    },
                );
            }
        }
        TypeTable { entries }
    }

    /// Resolution mirrors the validator: exact qualified name first, then
    /// `<current module>.<name>` for single-part names.
    pub fn resolve(&self, name: &QualIdent, current_module: &str) -> Option<&UserTypeInfo> {
        let text = name.to_string();
        if let Some(info) = self.entries.get(&text) {
            return Some(info);
        }
        if name.is_single() {
            return self.entries.get(&format!("{current_module}.{text}"));
        }
        None
    }
}

/// Rust path for a user type as seen from `current_module`'s generated
/// file. Sibling modules are reached through `super::`.
pub fn user_type_path(info: &UserTypeInfo, current_module: &str) -> String {
    if info.module_name == current_module {
        info.decl_name.clone()
    } else {
        format!("super::{}::{}", info.module_base, info.decl_name)
    }
}

/// Rust path of a generated item (encode/decode fn) in a user type's
/// module.
pub fn user_item_path(info: &UserTypeInfo, current_module: &str, item: &str) -> String {
    if info.module_name == current_module {
        item.to_string()
    } else {
        format!("super::{}::{}", info.module_base, item)
    }
}

pub fn primitive_rust_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::I8 => "i8",
        PrimitiveKind::I16 => "i16",
        PrimitiveKind::I32 => "i32",
        PrimitiveKind::I64 => "i64",
        PrimitiveKind::U8 => "u8",
        PrimitiveKind::U16 => "u16",
        PrimitiveKind::U32 => "u32",
        PrimitiveKind::U64 => "u64",
        PrimitiveKind::F32 => "f32",
        PrimitiveKind::F64 => "f64",
        PrimitiveKind::String => "String",
        PrimitiveKind::Bytes => "Vec<u8>",
    }
}

/// Owned Rust type for struct fields and result records.
pub fn rust_type(ty: &Type, table: &TypeTable, current_module: &str) -> String {
    match ty {
        Type::Primitive(kind) => primitive_rust_type(*kind).to_string(),
        Type::User(name) => match table.resolve(name, current_module) {
            Some(info) => user_type_path(info, current_module),
            None => name.to_string().replace('.', "::"),
        },
        Type::Vector(element) => {
            format!("Vec<{}>", rust_type(element, table, current_module))
        }
        Type::Map(key, value) => format!(
            "BTreeMap<{}, {}>",
            rust_type(key, table, current_module),
            rust_type(value, table, current_module)
        ),
        Type::Optional(inner) => {
            format!("Option<{}>", rust_type(inner, table, current_module))
        }
    }
}

pub fn is_scalar(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Primitive(
            PrimitiveKind::Bool
                | PrimitiveKind::I8
                | PrimitiveKind::I16
                | PrimitiveKind::I32
                | PrimitiveKind::I64
                | PrimitiveKind::U8
                | PrimitiveKind::U16
                | PrimitiveKind::U32
                | PrimitiveKind::U64
                | PrimitiveKind::F32
                | PrimitiveKind::F64
        )
    )
}

/// Parameter-position Rust type: scalars by value, strings and bytes as
/// slices, everything else by shared reference.
pub fn param_rust_type(ty: &Type, table: &TypeTable, current_module: &str) -> String {
    match ty {
        Type::Primitive(PrimitiveKind::String) => "&str".to_string(),
        Type::Primitive(PrimitiveKind::Bytes) => "&[u8]".to_string(),
        _ if is_scalar(ty) => rust_type(ty, table, current_module),
        _ => format!("&{}", rust_type(ty, table, current_module)),
    }
}

pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

pub fn to_shouty_case(name: &str) -> String {
    to_snake_case(name).to_ascii_uppercase()
}
