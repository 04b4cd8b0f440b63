//! Language-neutral intermediate representation lowered from validated
//! AST modules.
//!
//! The IR is a flat, per-module record: parser-only details (spans,
//! constants) are dropped, while ids, types, and attributes survive. A
//! [`CompilationUnit`] orders its modules lexicographically by name so
//! emission is reproducible.

use std::collections::BTreeMap;

use crate::ast::{self, ConstValue, MethodKind, Type};
use crate::frontend::Program;

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<ConstValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: u64,
    pub name: String,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<i64>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub values: Vec<Enumerator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub kind: MethodKind,
    pub parameters: Vec<Field>,
    pub result_fields: Vec<Field>,
    pub result_type: Option<Type>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub namespace_parts: Vec<String>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    pub interfaces: Vec<Interface>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    pub modules: Vec<Module>,
}

fn make_attributes(attrs: &[ast::Attribute]) -> Vec<Attribute> {
    attrs
        .iter()
        .map(|attr| Attribute {
            name: attr.name.clone(),
            value: attr.value.clone(),
        })
        .collect()
}

fn make_field(field: &ast::Field) -> Field {
    Field {
        id: field.id,
        name: field.name.clone(),
        ty: field.ty.clone(),
        default_value: field.default_value.clone(),
        attributes: make_attributes(&field.attrs),
    }
}

fn make_struct(decl: &ast::StructDecl) -> Struct {
    Struct {
        name: decl.name.clone(),
        fields: decl.fields.iter().map(make_field).collect(),
    }
}

fn make_enum(decl: &ast::EnumDecl) -> Enum {
    Enum {
        name: decl.name.clone(),
        values: decl
            .items
            .iter()
            .map(|item| Enumerator {
                name: item.name.clone(),
                value: item.value,
                attributes: make_attributes(&item.attrs),
            })
            .collect(),
    }
}

fn make_method(method: &ast::Method) -> Method {
    let mut result_fields = Vec::new();
    let mut result_type = None;
    match &method.result {
        Some(ast::MethodResult::Tuple(fields)) => {
            result_fields = fields.iter().map(make_field).collect();
        }
        Some(ast::MethodResult::Single(ty)) => {
            result_type = Some(ty.clone());
        }
        None => {}
    }

    Method {
        name: method.name.clone(),
        kind: method.kind,
        parameters: method.params.iter().map(make_field).collect(),
        result_fields,
        result_type,
        attributes: make_attributes(&method.attrs),
    }
}

fn make_interface(iface: &ast::InterfaceDecl) -> Interface {
    Interface {
        name: iface.name.clone(),
        methods: iface.methods.iter().map(make_method).collect(),
    }
}

/// Lowers every module of a validated program. No validation happens here;
/// run the validator first.
pub fn build_unit(program: &Program) -> CompilationUnit {
    let mut modules: BTreeMap<String, Module> = BTreeMap::new();

    for file in program.files.values() {
        let module_name = file.module.name.to_string();
        let entry = modules.entry(module_name.clone()).or_insert_with(|| Module {
            name: module_name.clone(),
            namespace_parts: file.module.name.parts.clone(),
            structs: Vec::new(),
            enums: Vec::new(),
            interfaces: Vec::new(),
        });

        for decl in &file.module.decls {
            match decl {
                ast::Decl::Struct(s) => entry.structs.push(make_struct(s)),
                ast::Decl::Enum(e) => entry.enums.push(make_enum(e)),
                ast::Decl::Interface(i) => entry.interfaces.push(make_interface(i)),
                ast::Decl::Const(_) => {}
            }
        }
    }

    CompilationUnit {
        modules: modules.into_values().collect(),
    }
}

#[cfg(test)]
#[path = "../tests/t_ir.rs"]
mod tests;
