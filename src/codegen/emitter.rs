//! Emits Rust bindings for one IR module: data types, wire descriptors,
//! serialization helpers, client stubs, and server skeletons.
//!
//! One `<module_base>.gen.rs` file is produced per module under the
//! output directory's namespace path. Generated files reference each
//! other as `super::<module_base>`, so embedders declare them as sibling
//! modules of one parent.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ast::{PrimitiveKind, Type};
use crate::ir::{CompilationUnit, Enum, Field, Interface, Method, Module, Struct};
use crate::runtime::hb1::{ValueKind, WireType};

use super::describe::describe_type;
use super::file_writer::write_file_if_changed;
use super::ids;
use super::rust_types::{
    is_scalar, module_base_name, param_rust_type, rust_type, to_shouty_case, to_snake_case,
    user_item_path, user_type_path, TypeTable, UserTypeKind,
};

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to write {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
}

#[derive(Debug, Clone)]
pub struct EmittedModule {
    pub module_name: String,
    pub path: PathBuf,
    pub written: bool,
}

/// Emits every module of the unit under `out_dir`, skipping writes whose
/// content is unchanged.
pub fn emit_unit(unit: &CompilationUnit, out_dir: &Path) -> Result<Vec<EmittedModule>, CodegenError> {
    let table = TypeTable::build(unit);
    let mut outputs = Vec::new();

    for module in &unit.modules {
        let content = generate_module(module, &table);
        let mut dir = out_dir.to_path_buf();
        for part in &module.namespace_parts {
            dir.push(part);
        }
        let base = module_base_name(&module.namespace_parts, &module.name);
        let path = dir.join(format!("{base}.gen.rs"));
        let written = write_file_if_changed(&path, &content)
            .map_err(|err| CodegenError::Io(path.clone(), err))?;
        outputs.push(EmittedModule {
            module_name: module.name.clone(),
            path,
            written,
        });
    }

    Ok(outputs)
}

struct Ctx<'a> {
    table: &'a TypeTable,
    module: &'a Module,
}

impl<'a> Ctx<'a> {
    fn rust_type(&self, ty: &Type) -> String {
        rust_type(ty, self.table, &self.module.name)
    }

    fn param_type(&self, ty: &Type) -> String {
        param_rust_type(ty, self.table, &self.module.name)
    }
}

/// Renders one module's generated source. Pure function of the IR, so
/// regeneration is reproducible byte for byte.
pub fn generate_module(module: &Module, table: &TypeTable) -> String {
    let ctx = Ctx { table, module };
    let mut out = String::new();

    let _ = writeln!(
        out,
        "// Generated by hasten from module `{}`. Do not edit.",
        module.name
    );
    out.push_str(
        "//\n\
         // Sibling generated modules are referenced as `super::<module>`;\n\
         // declare every generated file as a module of one shared parent.\n\
         #![allow(dead_code, unused_imports, unused_mut, unused_variables, clippy::all)]\n\n",
    );
    out.push_str("use std::collections::BTreeMap;\nuse std::sync::Arc;\n\n");
    out.push_str(
        "use hasten::runtime::channel::Channel;\n\
         use hasten::runtime::client::{self, MethodIds, PendingReply};\n\
         use hasten::runtime::dispatcher::Dispatcher;\n\
         use hasten::runtime::executor::Executor;\n\
         use hasten::runtime::hb1::{\n\
         \x20   self, FieldDescriptor, FieldValue, MessageDescriptor, Reader, Value, ValueKind,\n\
         \x20   WireType, Writer,\n\
         };\n\
         use hasten::runtime::rpc::{self, Handler, Request, Responder, Response, Status};\n\
         use hasten::runtime::{Result, RuntimeError};\n\n",
    );

    let _ = writeln!(
        out,
        "pub const MODULE_ID: u64 = {:#018x}; // fnv1a64(\"{}\")\n",
        ids::module_id(&module.name),
        module.name
    );

    for decl in &module.enums {
        emit_enum(&mut out, decl);
    }

    for decl in &module.structs {
        emit_struct_type(&mut out, &ctx, &decl.name, &decl.fields);
        emit_struct_descriptor(&mut out, &decl.name, &decl.fields);
        emit_struct_codec(&mut out, &ctx, decl);
    }

    for iface in &module.interfaces {
        emit_interface(&mut out, &ctx, iface);
    }

    out
}

// -- Enums --

fn enum_values(decl: &Enum) -> Vec<(String, i64)> {
    let mut next = 0i64;
    let mut values = Vec::with_capacity(decl.values.len());
    for item in &decl.values {
        let value = item.value.unwrap_or(next);
        next = value.wrapping_add(1);
        values.push((item.name.clone(), value));
    }
    values
}

fn emit_enum(out: &mut String, decl: &Enum) {
    let values = enum_values(decl);

    if values.is_empty() {
        let _ = writeln!(
            out,
            "#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]\n\
             pub enum {} {{}}\n",
            decl.name
        );
        let _ = writeln!(
            out,
            "impl {name} {{\n\
             \x20   pub fn value(self) -> i64 {{\n\
             \x20       match self {{}}\n\
             \x20   }}\n\n\
             \x20   pub fn from_value(_value: i64) -> Option<Self> {{\n\
             \x20       None\n\
             \x20   }}\n\
             }}\n",
            name = decl.name
        );
        return;
    }

    out.push_str(
        "#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]\n",
    );
    out.push_str("#[repr(i64)]\n");
    let _ = writeln!(out, "pub enum {} {{", decl.name);
    for (index, (name, value)) in values.iter().enumerate() {
        if index == 0 {
            out.push_str("    #[default]\n");
        }
        let _ = writeln!(out, "    {name} = {value},");
    }
    out.push_str("}\n\n");

    let _ = writeln!(out, "impl {} {{", decl.name);
    out.push_str("    pub fn value(self) -> i64 {\n        self as i64\n    }\n\n");
    out.push_str("    pub fn from_value(value: i64) -> Option<Self> {\n        match value {\n");
    for (name, value) in &values {
        let _ = writeln!(out, "            {value} => Some({}::{name}),", decl.name);
    }
    out.push_str("            _ => None,\n        }\n    }\n}\n\n");
}

// -- Struct types and descriptors --

fn emit_struct_type(out: &mut String, ctx: &Ctx<'_>, name: &str, fields: &[Field]) {
    out.push_str("#[derive(Debug, Clone, Default, PartialEq)]\n");
    let _ = writeln!(out, "pub struct {name} {{");
    for field in fields {
        let _ = writeln!(
            out,
            "    pub {}: {}, // field id: {}",
            field.name,
            ctx.rust_type(&field.ty),
            field.id
        );
    }
    out.push_str("}\n\n");
}

fn wire_type_name(wire_type: WireType) -> &'static str {
    match wire_type {
        WireType::Varint => "Varint",
        WireType::ZigZagVarint => "ZigZagVarint",
        WireType::Fixed32 => "Fixed32",
        WireType::Fixed64 => "Fixed64",
        WireType::LengthDelimited => "LengthDelimited",
        WireType::Capability => "Capability",
    }
}

fn value_kind_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Unsigned => "Unsigned",
        ValueKind::Signed => "Signed",
        ValueKind::String => "String",
        ValueKind::Bytes => "Bytes",
    }
}

fn emit_descriptor(out: &mut String, const_name: &str, fields: &[Field]) {
    let _ = writeln!(
        out,
        "pub const {const_name}: MessageDescriptor<'static> = MessageDescriptor {{\n    fields: &["
    );
    for field in fields {
        let shape = describe_type(&field.ty);
        let _ = writeln!(
            out,
            "        FieldDescriptor {{ id: {}, wire_type: WireType::{}, optional: {}, \
             preferred_kind: ValueKind::{} }},",
            field.id,
            wire_type_name(shape.wire_type),
            shape.optional,
            value_kind_name(shape.kind)
        );
    }
    out.push_str("    ],\n};\n\n");
}

fn emit_struct_descriptor(out: &mut String, name: &str, fields: &[Field]) {
    let const_name = format!("{}_DESCRIPTOR", to_shouty_case(name));
    emit_descriptor(out, &const_name, fields);
}

// -- Encode statement generation --

fn indent_str(indent: usize) -> String {
    "    ".repeat(indent)
}

/// Appends statements encoding one message field through `writer`.
/// `access` must be a place expression for the field's value.
fn field_encode(out: &mut String, ctx: &Ctx<'_>, indent: usize, id: u64, ty: &Type, access: &str) {
    let pad = indent_str(indent);
    match ty {
        Type::Primitive(kind) => match kind {
            PrimitiveKind::Bool => {
                let _ = writeln!(
                    out,
                    "{pad}writer.write_field_varint({id}, u64::from({access}));"
                );
            }
            PrimitiveKind::U8 | PrimitiveKind::U16 | PrimitiveKind::U32 | PrimitiveKind::U64 => {
                let _ = writeln!(
                    out,
                    "{pad}writer.write_field_varint({id}, {access} as u64);"
                );
            }
            PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64 => {
                let _ = writeln!(
                    out,
                    "{pad}writer.write_field_svarint({id}, {access} as i64);"
                );
            }
            PrimitiveKind::F32 => {
                let _ = writeln!(
                    out,
                    "{pad}writer.write_field_fixed32({id}, {access}.to_bits());"
                );
            }
            PrimitiveKind::F64 => {
                let _ = writeln!(
                    out,
                    "{pad}writer.write_field_fixed64({id}, {access}.to_bits());"
                );
            }
            PrimitiveKind::String => {
                let _ = writeln!(out, "{pad}writer.write_field_string({id}, &{access});");
            }
            PrimitiveKind::Bytes => {
                let _ = writeln!(out, "{pad}writer.write_field_bytes({id}, &{access});");
            }
        },
        Type::User(name) => {
            let info = ctx.table.resolve(name, &ctx.module.name);
            match info.map(|info| info.kind) {
                Some(UserTypeKind::Enum) => {
                    let _ = writeln!(out, "{pad}{{");
                    let _ = writeln!(out, "{pad}    let mut blob = Vec::new();");
                    let _ = writeln!(
                        out,
                        "{pad}    hb1::write_varint(&mut blob, hb1::zigzag_encode({access}.value()));"
                    );
                    let _ = writeln!(out, "{pad}    writer.write_field_bytes({id}, &blob);");
                    let _ = writeln!(out, "{pad}}}");
                }
                _ => {
                    let encode_fn = struct_encode_path(ctx, name);
                    let _ = writeln!(out, "{pad}{{");
                    let _ = writeln!(out, "{pad}    let mut blob = Vec::new();");
                    let _ = writeln!(out, "{pad}    {encode_fn}(&{access}, &mut blob)?;");
                    let _ = writeln!(out, "{pad}    writer.write_field_bytes({id}, &blob);");
                    let _ = writeln!(out, "{pad}}}");
                }
            }
        }
        Type::Vector(element) => {
            let _ = writeln!(out, "{pad}{{");
            let _ = writeln!(out, "{pad}    let mut blob = Vec::new();");
            let _ = writeln!(
                out,
                "{pad}    hb1::write_varint(&mut blob, {access}.len() as u64);"
            );
            let _ = writeln!(out, "{pad}    for item0 in &{access} {{");
            element_encode(out, ctx, indent + 2, element, "(*item0)", "blob", 1);
            let _ = writeln!(out, "{pad}    }}");
            let _ = writeln!(out, "{pad}    writer.write_field_bytes({id}, &blob);");
            let _ = writeln!(out, "{pad}}}");
        }
        Type::Map(key, value) => {
            let _ = writeln!(out, "{pad}{{");
            let _ = writeln!(out, "{pad}    let mut blob = Vec::new();");
            let _ = writeln!(
                out,
                "{pad}    hb1::write_varint(&mut blob, {access}.len() as u64);"
            );
            let _ = writeln!(out, "{pad}    for (key0, value0) in &{access} {{");
            element_encode(out, ctx, indent + 2, key, "(*key0)", "blob", 1);
            element_encode(out, ctx, indent + 2, value, "(*value0)", "blob", 1);
            let _ = writeln!(out, "{pad}    }}");
            let _ = writeln!(out, "{pad}    writer.write_field_bytes({id}, &blob);");
            let _ = writeln!(out, "{pad}}}");
        }
        Type::Optional(inner) => {
            let _ = writeln!(out, "{pad}if let Some(present) = &{access} {{");
            field_encode(out, ctx, indent + 1, id, inner, "(*present)");
            let _ = writeln!(out, "{pad}}}");
        }
    }
}

fn struct_encode_path(ctx: &Ctx<'_>, name: &crate::ast::QualIdent) -> String {
    match ctx.table.resolve(name, &ctx.module.name) {
        Some(info) => {
            let item = format!("encode_{}", to_snake_case(&info.decl_name));
            user_item_path(info, &ctx.module.name, &item)
        }
        None => format!("encode_{}", to_snake_case(&name.to_string().replace('.', "_"))),
    }
}

fn struct_decode_path(ctx: &Ctx<'_>, name: &crate::ast::QualIdent) -> String {
    match ctx.table.resolve(name, &ctx.module.name) {
        Some(info) => {
            let item = format!("decode_{}", to_snake_case(&info.decl_name));
            user_item_path(info, &ctx.module.name, &item)
        }
        None => format!("decode_{}", to_snake_case(&name.to_string().replace('.', "_"))),
    }
}

fn enum_path(ctx: &Ctx<'_>, name: &crate::ast::QualIdent) -> String {
    match ctx.table.resolve(name, &ctx.module.name) {
        Some(info) => user_type_path(info, &ctx.module.name),
        None => name.to_string().replace('.', "::"),
    }
}

/// Appends statements encoding one container element into `buf`.
fn element_encode(
    out: &mut String,
    ctx: &Ctx<'_>,
    indent: usize,
    ty: &Type,
    access: &str,
    buf: &str,
    depth: usize,
) {
    let pad = indent_str(indent);
    match ty {
        Type::Primitive(kind) => match kind {
            PrimitiveKind::Bool => {
                let _ = writeln!(
                    out,
                    "{pad}hb1::write_varint(&mut {buf}, u64::from({access}));"
                );
            }
            PrimitiveKind::U8 | PrimitiveKind::U16 | PrimitiveKind::U32 | PrimitiveKind::U64 => {
                let _ = writeln!(out, "{pad}hb1::write_varint(&mut {buf}, {access} as u64);");
            }
            PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64 => {
                let _ = writeln!(
                    out,
                    "{pad}hb1::write_varint(&mut {buf}, hb1::zigzag_encode({access} as i64));"
                );
            }
            PrimitiveKind::F32 => {
                let _ = writeln!(
                    out,
                    "{pad}{buf}.extend_from_slice(&{access}.to_bits().to_be_bytes());"
                );
            }
            PrimitiveKind::F64 => {
                let _ = writeln!(
                    out,
                    "{pad}{buf}.extend_from_slice(&{access}.to_bits().to_be_bytes());"
                );
            }
            PrimitiveKind::String => {
                let _ = writeln!(
                    out,
                    "{pad}hb1::write_varint(&mut {buf}, {access}.len() as u64);"
                );
                let _ = writeln!(out, "{pad}{buf}.extend_from_slice({access}.as_bytes());");
            }
            PrimitiveKind::Bytes => {
                let _ = writeln!(
                    out,
                    "{pad}hb1::write_varint(&mut {buf}, {access}.len() as u64);"
                );
                let _ = writeln!(out, "{pad}{buf}.extend_from_slice(&{access});");
            }
        },
        Type::User(name) => {
            let info = ctx.table.resolve(name, &ctx.module.name);
            match info.map(|info| info.kind) {
                Some(UserTypeKind::Enum) => {
                    let _ = writeln!(
                        out,
                        "{pad}hb1::write_varint(&mut {buf}, hb1::zigzag_encode({access}.value()));"
                    );
                }
                _ => {
                    let encode_fn = struct_encode_path(ctx, name);
                    let _ = writeln!(out, "{pad}{{");
                    let _ = writeln!(out, "{pad}    let mut nested{depth} = Vec::new();");
                    let _ = writeln!(
                        out,
                        "{pad}    {encode_fn}(&{access}, &mut nested{depth})?;"
                    );
                    let _ = writeln!(
                        out,
                        "{pad}    hb1::write_varint(&mut {buf}, nested{depth}.len() as u64);"
                    );
                    let _ = writeln!(out, "{pad}    {buf}.extend_from_slice(&nested{depth});");
                    let _ = writeln!(out, "{pad}}}");
                }
            }
        }
        Type::Vector(element) => {
            let _ = writeln!(out, "{pad}{{");
            let _ = writeln!(out, "{pad}    let mut nested{depth} = Vec::new();");
            let _ = writeln!(
                out,
                "{pad}    hb1::write_varint(&mut nested{depth}, {access}.len() as u64);"
            );
            let _ = writeln!(out, "{pad}    for item{depth} in &{access} {{");
            element_encode(
                out,
                ctx,
                indent + 2,
                element,
                &format!("(*item{depth})"),
                &format!("nested{depth}"),
                depth + 1,
            );
            let _ = writeln!(out, "{pad}    }}");
            let _ = writeln!(
                out,
                "{pad}    hb1::write_varint(&mut {buf}, nested{depth}.len() as u64);"
            );
            let _ = writeln!(out, "{pad}    {buf}.extend_from_slice(&nested{depth});");
            let _ = writeln!(out, "{pad}}}");
        }
        Type::Map(key, value) => {
            let _ = writeln!(out, "{pad}{{");
            let _ = writeln!(out, "{pad}    let mut nested{depth} = Vec::new();");
            let _ = writeln!(
                out,
                "{pad}    hb1::write_varint(&mut nested{depth}, {access}.len() as u64);"
            );
            let _ = writeln!(
                out,
                "{pad}    for (key{depth}, value{depth}) in &{access} {{"
            );
            element_encode(
                out,
                ctx,
                indent + 2,
                key,
                &format!("(*key{depth})"),
                &format!("nested{depth}"),
                depth + 1,
            );
            element_encode(
                out,
                ctx,
                indent + 2,
                value,
                &format!("(*value{depth})"),
                &format!("nested{depth}"),
                depth + 1,
            );
            let _ = writeln!(out, "{pad}    }}");
            let _ = writeln!(
                out,
                "{pad}    hb1::write_varint(&mut {buf}, nested{depth}.len() as u64);"
            );
            let _ = writeln!(out, "{pad}    {buf}.extend_from_slice(&nested{depth});");
            let _ = writeln!(out, "{pad}}}");
        }
        Type::Optional(inner) => {
            let _ = writeln!(out, "{pad}match &{access} {{");
            let _ = writeln!(out, "{pad}    Some(present{depth}) => {{");
            let _ = writeln!(out, "{pad}        {buf}.push(1);");
            element_encode(
                out,
                ctx,
                indent + 2,
                inner,
                &format!("(*present{depth})"),
                buf,
                depth + 1,
            );
            let _ = writeln!(out, "{pad}    }}");
            let _ = writeln!(out, "{pad}    None => {buf}.push(0),");
            let _ = writeln!(out, "{pad}}}");
        }
    }
}

// -- Decode expression generation --

/// A block expression converting a decoded `FieldValue`'s `field.value`
/// into the field's Rust type. Optionals are handled by the caller.
fn field_decode_expr(ctx: &Ctx<'_>, ty: &Type) -> String {
    match ty {
        Type::Primitive(kind) => match kind {
            PrimitiveKind::Bool => "field.value.into_unsigned()? != 0".to_string(),
            PrimitiveKind::U8 => "field.value.into_unsigned()? as u8".to_string(),
            PrimitiveKind::U16 => "field.value.into_unsigned()? as u16".to_string(),
            PrimitiveKind::U32 => "field.value.into_unsigned()? as u32".to_string(),
            PrimitiveKind::U64 => "field.value.into_unsigned()?".to_string(),
            PrimitiveKind::I8 => "field.value.into_signed()? as i8".to_string(),
            PrimitiveKind::I16 => "field.value.into_signed()? as i16".to_string(),
            PrimitiveKind::I32 => "field.value.into_signed()? as i32".to_string(),
            PrimitiveKind::I64 => "field.value.into_signed()?".to_string(),
            PrimitiveKind::F32 => {
                "f32::from_bits(field.value.into_unsigned()? as u32)".to_string()
            }
            PrimitiveKind::F64 => "f64::from_bits(field.value.into_unsigned()?)".to_string(),
            PrimitiveKind::String => "field.value.into_string()?".to_string(),
            PrimitiveKind::Bytes => "field.value.into_bytes()?".to_string(),
        },
        Type::User(name) => {
            let info = ctx.table.resolve(name, &ctx.module.name);
            match info.map(|info| info.kind) {
                Some(UserTypeKind::Enum) => {
                    let path = enum_path(ctx, name);
                    format!(
                        "{{\n\
                         \x20           let blob = field.value.into_bytes()?;\n\
                         \x20           let raw = hb1::zigzag_decode(hb1::decode_varint(&blob)?);\n\
                         \x20           {path}::from_value(raw)\n\
                         \x20               .ok_or_else(|| RuntimeError::transport(\"invalid enumerator\"))?\n\
                         \x20       }}"
                    )
                }
                _ => {
                    let decode_fn = struct_decode_path(ctx, name);
                    format!(
                        "{{\n\
                         \x20           let blob = field.value.into_bytes()?;\n\
                         \x20           {decode_fn}(&blob)?\n\
                         \x20       }}"
                    )
                }
            }
        }
        Type::Vector(_) | Type::Map(_, _) => {
            let mut body = String::new();
            container_decode_body(&mut body, ctx, 3, ty, "reader0", 1);
            format!(
                "{{\n\
                 \x20           let blob = field.value.into_bytes()?;\n\
                 \x20           let mut reader0 = Reader::new(&blob);\n\
                 {body}\
                 \x20       }}"
            )
        }
        Type::Optional(inner) => field_decode_expr(ctx, inner),
    }
}

/// Statements (ending in a tail expression) that read one container body
/// (`varint(count)` then elements) out of `reader`.
fn container_decode_body(
    out: &mut String,
    ctx: &Ctx<'_>,
    indent: usize,
    ty: &Type,
    reader: &str,
    depth: usize,
) {
    let pad = indent_str(indent);
    match ty {
        Type::Vector(element) => {
            let _ = writeln!(out, "{pad}let count{depth} = {reader}.read_varint()?;");
            let _ = writeln!(
                out,
                "{pad}let mut items{depth} = Vec::with_capacity(count{depth} as usize);"
            );
            let _ = writeln!(out, "{pad}for _ in 0..count{depth} {{");
            let element_expr = element_decode_expr(ctx, indent + 1, element, reader, depth + 1);
            let _ = writeln!(out, "{pad}    items{depth}.push({element_expr});");
            let _ = writeln!(out, "{pad}}}");
            let _ = writeln!(out, "{pad}items{depth}");
        }
        Type::Map(key, value) => {
            let _ = writeln!(out, "{pad}let count{depth} = {reader}.read_varint()?;");
            let _ = writeln!(out, "{pad}let mut map{depth} = BTreeMap::new();");
            let _ = writeln!(out, "{pad}for _ in 0..count{depth} {{");
            let key_expr = element_decode_expr(ctx, indent + 1, key, reader, depth + 1);
            let value_expr = element_decode_expr(ctx, indent + 1, value, reader, depth + 1);
            let _ = writeln!(out, "{pad}    let entry_key = {key_expr};");
            let _ = writeln!(out, "{pad}    let entry_value = {value_expr};");
            let _ = writeln!(out, "{pad}    map{depth}.insert(entry_key, entry_value);");
            let _ = writeln!(out, "{pad}}}");
            let _ = writeln!(out, "{pad}map{depth}");
        }
        _ => {
            let expr = element_decode_expr(ctx, indent, ty, reader, depth);
            let _ = writeln!(out, "{pad}{expr}");
        }
    }
}

/// Expression decoding one container element from `reader`.
fn element_decode_expr(
    ctx: &Ctx<'_>,
    indent: usize,
    ty: &Type,
    reader: &str,
    depth: usize,
) -> String {
    let pad = indent_str(indent);
    match ty {
        Type::Primitive(kind) => match kind {
            PrimitiveKind::Bool => format!("{{ {reader}.read_varint()? != 0 }}"),
            PrimitiveKind::U8 => format!("{{ {reader}.read_varint()? as u8 }}"),
            PrimitiveKind::U16 => format!("{{ {reader}.read_varint()? as u16 }}"),
            PrimitiveKind::U32 => format!("{{ {reader}.read_varint()? as u32 }}"),
            PrimitiveKind::U64 => format!("{{ {reader}.read_varint()? }}"),
            PrimitiveKind::I8 => {
                format!("{{ hb1::zigzag_decode({reader}.read_varint()?) as i8 }}")
            }
            PrimitiveKind::I16 => {
                format!("{{ hb1::zigzag_decode({reader}.read_varint()?) as i16 }}")
            }
            PrimitiveKind::I32 => {
                format!("{{ hb1::zigzag_decode({reader}.read_varint()?) as i32 }}")
            }
            PrimitiveKind::I64 => format!("{{ hb1::zigzag_decode({reader}.read_varint()?) }}"),
            PrimitiveKind::F32 => format!(
                "{{\n\
                 {pad}    let raw = {reader}.read_exact(4)?;\n\
                 {pad}    f32::from_bits(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))\n\
                 {pad}}}"
            ),
            PrimitiveKind::F64 => format!(
                "{{\n\
                 {pad}    let raw = {reader}.read_exact(8)?;\n\
                 {pad}    f64::from_bits(u64::from_be_bytes([\n\
                 {pad}        raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],\n\
                 {pad}    ]))\n\
                 {pad}}}"
            ),
            PrimitiveKind::String => format!(
                "{{\n\
                 {pad}    let len = {reader}.read_varint()? as usize;\n\
                 {pad}    String::from_utf8_lossy({reader}.read_exact(len)?).into_owned()\n\
                 {pad}}}"
            ),
            PrimitiveKind::Bytes => format!(
                "{{\n\
                 {pad}    let len = {reader}.read_varint()? as usize;\n\
                 {pad}    {reader}.read_exact(len)?.to_vec()\n\
                 {pad}}}"
            ),
        },
        Type::User(name) => {
            let info = ctx.table.resolve(name, &ctx.module.name);
            match info.map(|info| info.kind) {
                Some(UserTypeKind::Enum) => {
                    let path = enum_path(ctx, name);
                    format!(
                        "{{\n\
                         {pad}    let raw = hb1::zigzag_decode({reader}.read_varint()?);\n\
                         {pad}    {path}::from_value(raw)\n\
                         {pad}        .ok_or_else(|| RuntimeError::transport(\"invalid enumerator\"))?\n\
                         {pad}}}"
                    )
                }
                _ => {
                    let decode_fn = struct_decode_path(ctx, name);
                    format!(
                        "{{\n\
                         {pad}    let len = {reader}.read_varint()? as usize;\n\
                         {pad}    {decode_fn}({reader}.read_exact(len)?)?\n\
                         {pad}}}"
                    )
                }
            }
        }
        Type::Vector(_) | Type::Map(_, _) => {
            let mut body = String::new();
            container_decode_body(
                &mut body,
                ctx,
                indent + 1,
                ty,
                &format!("nested_reader{depth}"),
                depth + 1,
            );
            format!(
                "{{\n\
                 {pad}    let len = {reader}.read_varint()? as usize;\n\
                 {pad}    let blob = {reader}.read_exact(len)?;\n\
                 {pad}    let mut nested_reader{depth} = Reader::new(blob);\n\
                 {body}\
                 {pad}}}"
            )
        }
        Type::Optional(inner) => {
            let inner_expr = element_decode_expr(ctx, indent + 1, inner, reader, depth + 1);
            format!(
                "{{\n\
                 {pad}    if {reader}.read_byte()? != 0 {{\n\
                 {pad}        Some({inner_expr})\n\
                 {pad}    }} else {{\n\
                 {pad}        None\n\
                 {pad}    }}\n\
                 {pad}}}"
            )
        }
    }
}

// -- Struct codec functions --

fn emit_struct_codec(out: &mut String, ctx: &Ctx<'_>, decl: &Struct) {
    let snake = to_snake_case(&decl.name);
    let descriptor = format!("{}_DESCRIPTOR", to_shouty_case(&decl.name));

    let _ = writeln!(
        out,
        "pub fn encode_{snake}(value: &{}, out: &mut Vec<u8>) -> Result<()> {{",
        decl.name
    );
    out.push_str("    let mut writer = Writer::new(out);\n");
    for field in &decl.fields {
        field_encode(
            out,
            ctx,
            1,
            field.id,
            &field.ty,
            &format!("value.{}", field.name),
        );
    }
    out.push_str("    Ok(())\n}\n\n");

    let _ = writeln!(
        out,
        "pub fn decode_{snake}(data: &[u8]) -> Result<{}> {{",
        decl.name
    );
    let _ = writeln!(
        out,
        "    let values = hb1::decode_message_bytes(&{descriptor}, data)?;"
    );
    let _ = writeln!(out, "    let mut out = {}::default();", decl.name);
    out.push_str("    for field in values {\n        match field.id {\n");
    for field in &decl.fields {
        emit_field_assign(out, ctx, 3, &field.ty, field.id, &format!("out.{}", field.name));
    }
    out.push_str("            _ => {}\n        }\n    }\n    Ok(out)\n}\n\n");
}

fn emit_field_assign(
    out: &mut String,
    ctx: &Ctx<'_>,
    indent: usize,
    ty: &Type,
    id: u64,
    target: &str,
) {
    let pad = indent_str(indent);
    let expr = field_decode_expr(ctx, ty);
    if matches!(ty, Type::Optional(_)) {
        let _ = writeln!(out, "{pad}{id} => {target} = Some({expr}),");
    } else {
        let _ = writeln!(out, "{pad}{id} => {target} = {expr},");
    }
}

// -- Interfaces --

fn result_type_name(iface: &Interface, method: &Method, ctx: &Ctx<'_>) -> String {
    if !method.result_fields.is_empty() {
        format!("{}{}Result", iface.name, upper_first(&method.name))
    } else if let Some(ty) = &method.result_type {
        ctx.rust_type(ty)
    } else {
        "()".to_string()
    }
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn method_const_base(iface: &Interface, method: &Method) -> String {
    format!(
        "{}_{}",
        to_shouty_case(&iface.name),
        to_shouty_case(&method.name)
    )
}

fn param_list(ctx: &Ctx<'_>, method: &Method) -> String {
    method
        .parameters
        .iter()
        .map(|param| format!("{}: {}", param.name, ctx.param_type(&param.ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn param_access(param: &Field) -> String {
    if is_scalar(&param.ty) {
        param.name.clone()
    } else {
        format!("(*{})", param.name)
    }
}

fn emit_interface(out: &mut String, ctx: &Ctx<'_>, iface: &Interface) {
    let iface_snake = to_snake_case(&iface.name);
    let iface_shouty = to_shouty_case(&iface.name);

    let _ = writeln!(
        out,
        "pub const {iface_shouty}_INTERFACE_ID: u64 = {:#018x}; // fnv1a64(\"{}.{}\")\n",
        ids::interface_id(&ctx.module.name, &iface.name),
        ctx.module.name,
        iface.name
    );

    for method in &iface.methods {
        let base = method_const_base(iface, method);
        let _ = writeln!(
            out,
            "pub const {base}_METHOD_ID: u64 = {:#018x}; // fnv1a64(\"{}.{}.{}\")",
            ids::method_id(&ctx.module.name, &iface.name, &method.name),
            ctx.module.name,
            iface.name,
            method.name
        );
        let _ = writeln!(
            out,
            "pub const {base}_IDS: MethodIds = MethodIds {{\n\
             \x20   module_id: MODULE_ID,\n\
             \x20   interface_id: {iface_shouty}_INTERFACE_ID,\n\
             \x20   method_id: {base}_METHOD_ID,\n\
             }};\n"
        );
    }

    // Result records for tuple results.
    for method in &iface.methods {
        if method.result_fields.is_empty() {
            continue;
        }
        let name = result_type_name(iface, method, ctx);
        emit_struct_type(out, ctx, &name, &method.result_fields);
    }

    // Request/response descriptors and codec helpers.
    for method in &iface.methods {
        emit_method_codec(out, ctx, iface, method);
    }

    emit_server(out, ctx, iface, &iface_snake);
    emit_client(out, ctx, iface);
}

fn emit_method_codec(out: &mut String, ctx: &Ctx<'_>, iface: &Interface, method: &Method) {
    let base = method_const_base(iface, method);
    let fn_base = format!("{}_{}", to_snake_case(&iface.name), to_snake_case(&method.name));

    emit_descriptor(out, &format!("{base}_REQUEST_DESCRIPTOR"), &method.parameters);

    // Request encode: parameters in call shape.
    let params = param_list(ctx, method);
    let sep = if params.is_empty() { "" } else { ", " };
    let _ = writeln!(
        out,
        "pub fn encode_{fn_base}_request({params}{sep}out: &mut Vec<u8>) -> Result<()> {{"
    );
    out.push_str("    let mut writer = Writer::new(out);\n");
    for param in &method.parameters {
        field_encode(out, ctx, 1, param.id, &param.ty, &param_access(param));
    }
    out.push_str("    Ok(())\n}\n\n");

    // Request decode: a tuple of owned parameter values.
    let tuple_types = method
        .parameters
        .iter()
        .map(|param| ctx.rust_type(&param.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let tuple_type = format!("({tuple_types}{})", if method.parameters.len() == 1 { "," } else { "" });
    let _ = writeln!(
        out,
        "pub fn decode_{fn_base}_request(data: &[u8]) -> Result<{tuple_type}> {{"
    );
    let _ = writeln!(
        out,
        "    let values = hb1::decode_message_bytes(&{base}_REQUEST_DESCRIPTOR, data)?;"
    );
    for param in &method.parameters {
        let _ = writeln!(
            out,
            "    let mut {}: {} = Default::default();",
            param.name,
            ctx.rust_type(&param.ty)
        );
    }
    out.push_str("    for field in values {\n        match field.id {\n");
    for param in &method.parameters {
        emit_field_assign(out, ctx, 3, &param.ty, param.id, &param.name);
    }
    out.push_str("            _ => {}\n        }\n    }\n");
    let tuple_values = method
        .parameters
        .iter()
        .map(|param| param.name.clone())
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(
        out,
        "    Ok(({tuple_values}{}))",
        if method.parameters.len() == 1 { "," } else { "" }
    );
    out.push_str("}\n\n");

    // Response: tuple record, single type, or empty.
    if !method.result_fields.is_empty() {
        let record = result_type_name(iface, method, ctx);
        emit_descriptor(out, &format!("{base}_RESPONSE_DESCRIPTOR"), &method.result_fields);

        let _ = writeln!(
            out,
            "pub fn encode_{fn_base}_response(value: &{record}, out: &mut Vec<u8>) -> Result<()> {{"
        );
        out.push_str("    let mut writer = Writer::new(out);\n");
        for field in &method.result_fields {
            field_encode(
                out,
                ctx,
                1,
                field.id,
                &field.ty,
                &format!("value.{}", field.name),
            );
        }
        out.push_str("    Ok(())\n}\n\n");

        let _ = writeln!(
            out,
            "pub fn decode_{fn_base}_response(data: &[u8]) -> Result<{record}> {{"
        );
        let _ = writeln!(
            out,
            "    let values = hb1::decode_message_bytes(&{base}_RESPONSE_DESCRIPTOR, data)?;"
        );
        let _ = writeln!(out, "    let mut out = {record}::default();");
        out.push_str("    for field in values {\n        match field.id {\n");
        for field in &method.result_fields {
            emit_field_assign(out, ctx, 3, &field.ty, field.id, &format!("out.{}", field.name));
        }
        out.push_str("            _ => {}\n        }\n    }\n    Ok(out)\n}\n\n");
    } else if let Some(result_ty) = &method.result_type {
        let fields = [Field {
            id: 1,
            name: "result".to_string(),
            ty: result_ty.clone(),
            default_value: None,
            attributes: Vec::new(),
        }];
        emit_descriptor(out, &format!("{base}_RESPONSE_DESCRIPTOR"), &fields);

        let _ = writeln!(
            out,
            "pub fn encode_{fn_base}_response(value: {}, out: &mut Vec<u8>) -> Result<()> {{",
            ctx.param_type(result_ty)
        );
        out.push_str("    let mut writer = Writer::new(out);\n");
        let access = if is_scalar(result_ty) {
            "value".to_string()
        } else {
            "(*value)".to_string()
        };
        field_encode(out, ctx, 1, 1, result_ty, &access);
        out.push_str("    Ok(())\n}\n\n");

        let rust = ctx.rust_type(result_ty);
        let _ = writeln!(
            out,
            "pub fn decode_{fn_base}_response(data: &[u8]) -> Result<{rust}> {{"
        );
        let _ = writeln!(
            out,
            "    let values = hb1::decode_message_bytes(&{base}_RESPONSE_DESCRIPTOR, data)?;"
        );
        let _ = writeln!(out, "    let mut out: {rust} = Default::default();");
        out.push_str("    for field in values {\n        match field.id {\n");
        emit_field_assign(out, ctx, 3, result_ty, 1, "out");
        out.push_str("            _ => {}\n        }\n    }\n    Ok(out)\n}\n\n");
    } else {
        let _ = writeln!(
            out,
            "pub const {base}_RESPONSE_DESCRIPTOR: MessageDescriptor<'static> = \
             MessageDescriptor {{ fields: &[] }};\n"
        );
        let _ = writeln!(
            out,
            "pub fn encode_{fn_base}_response(out: &mut Vec<u8>) -> Result<()> {{\n\
             \x20   let _ = out;\n\
             \x20   Ok(())\n\
             }}\n"
        );
        let _ = writeln!(
            out,
            "pub fn decode_{fn_base}_response(data: &[u8]) -> Result<()> {{\n\
             \x20   let _ = data;\n\
             \x20   Ok(())\n\
             }}\n"
        );
    }
}

fn emit_server(out: &mut String, ctx: &Ctx<'_>, iface: &Interface, iface_snake: &str) {
    // Service trait the user implements; methods run on executor threads.
    let _ = writeln!(out, "pub trait {}: Send + Sync {{", iface.name);
    for method in &iface.methods {
        let params = param_list(ctx, method);
        let sep = if params.is_empty() { "" } else { ", " };
        let result = result_type_name(iface, method, ctx);
        let _ = writeln!(
            out,
            "    fn {}(&self{sep}{params}) -> Result<{result}>;",
            to_snake_case(&method.name)
        );
    }
    out.push_str("}\n\n");

    // Method dispatch on the decoded request.
    let _ = writeln!(
        out,
        "fn dispatch_{iface_snake}(implementation: &dyn {}, request: &Request) -> Response {{",
        iface.name
    );
    out.push_str("    match request.method_id {\n");
    for method in &iface.methods {
        let base = method_const_base(iface, method);
        let fn_base = format!("{}_{}", iface_snake, to_snake_case(&method.name));
        let _ = writeln!(out, "        {base}_METHOD_ID => {{");

        let names = method
            .parameters
            .iter()
            .map(|param| param.name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        let pattern = format!(
            "({names}{})",
            if method.parameters.len() == 1 { "," } else { "" }
        );
        let _ = writeln!(
            out,
            "            let {pattern} = match decode_{fn_base}_request(&request.payload) {{\n\
             \x20               Ok(args) => args,\n\
             \x20               Err(_) => return Response::status_only(Status::InvalidRequest),\n\
             \x20           }};"
        );

        let call_args = method
            .parameters
            .iter()
            .map(|param| {
                if is_scalar(&param.ty) {
                    param.name.clone()
                } else {
                    format!("&{}", param.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "            match implementation.{}({call_args}) {{",
            to_snake_case(&method.name)
        );

        if method.result_fields.is_empty() && method.result_type.is_none() {
            let _ = writeln!(
                out,
                "                Ok(()) => {{\n\
                 \x20                   let mut body = Vec::new();\n\
                 \x20                   match encode_{fn_base}_response(&mut body) {{\n\
                 \x20                       Ok(()) => Response {{ status: Status::Ok, body }},\n\
                 \x20                       Err(_) => Response::status_only(Status::InternalError),\n\
                 \x20                   }}\n\
                 \x20               }}"
            );
        } else {
            let result_arg = if !method.result_fields.is_empty() {
                "&result".to_string()
            } else {
                match &method.result_type {
                    Some(ty) if is_scalar(ty) => "result".to_string(),
                    _ => "&result".to_string(),
                }
            };
            let _ = writeln!(
                out,
                "                Ok(result) => {{\n\
                 \x20                   let mut body = Vec::new();\n\
                 \x20                   match encode_{fn_base}_response({result_arg}, &mut body) {{\n\
                 \x20                       Ok(()) => Response {{ status: Status::Ok, body }},\n\
                 \x20                       Err(_) => Response::status_only(Status::InternalError),\n\
                 \x20                   }}\n\
                 \x20               }}"
            );
        }
        out.push_str(
            "                Err(_) => Response::status_only(Status::ApplicationError),\n\
             \x20           }\n\
             \x20       }\n",
        );
    }
    out.push_str("        _ => Response::status_only(Status::NotFound),\n    }\n}\n\n");

    // Registration: handlers always run the implementation on the
    // executor, never on the reactor thread.
    let iface_shouty = to_shouty_case(&iface.name);
    let _ = writeln!(
        out,
        "pub fn bind_{iface_snake}(implementation: Arc<dyn {name}>, executor: Arc<dyn Executor>) {{\n\
         \x20   let handler: Handler = Arc::new(move |request: Arc<Request>, responder: Responder| {{\n\
         \x20       let implementation = implementation.clone();\n\
         \x20       executor.schedule(Box::new(move || {{\n\
         \x20           let response = dispatch_{iface_snake}(implementation.as_ref(), request.as_ref());\n\
         \x20           responder(response);\n\
         \x20       }}));\n\
         \x20   }});\n\
         \x20   rpc::register_handler({iface_shouty}_INTERFACE_ID, handler);\n\
         }}\n",
        name = iface.name
    );
}

fn emit_client(out: &mut String, ctx: &Ctx<'_>, iface: &Interface) {
    let client_name = format!("{}Client", iface.name);
    let iface_snake = to_snake_case(&iface.name);

    let _ = writeln!(
        out,
        "pub struct {client_name} {{\n\
         \x20   channel: Arc<dyn Channel>,\n\
         \x20   dispatcher: Arc<Dispatcher>,\n\
         }}\n"
    );

    let _ = writeln!(out, "impl {client_name} {{");
    let _ = writeln!(
        out,
        "    pub fn new(channel: Arc<dyn Channel>, dispatcher: Arc<Dispatcher>) -> Self {{\n\
         \x20       {client_name} {{ channel, dispatcher }}\n\
         \x20   }}\n"
    );

    for method in &iface.methods {
        let base = method_const_base(iface, method);
        let fn_base = format!("{}_{}", iface_snake, to_snake_case(&method.name));
        let method_snake = to_snake_case(&method.name);
        let result = result_type_name(iface, method, ctx);
        let params = param_list(ctx, method);
        let sep = if params.is_empty() { "" } else { ", " };
        let arg_names = method
            .parameters
            .iter()
            .map(|param| param.name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        let arg_sep = if arg_names.is_empty() { "" } else { ", " };

        // Callback shape: invoked exactly once with the outcome.
        let _ = writeln!(
            out,
            "    pub fn {method_snake}(\n\
             \x20       &self{sep}{params},\n\
             \x20       callback: impl FnOnce(Result<{result}>) + Send + 'static,\n\
             \x20   ) {{\n\
             \x20       let mut body = Vec::new();\n\
             \x20       if let Err(err) = encode_{fn_base}_request({arg_names}{arg_sep}&mut body) {{\n\
             \x20           callback(Err(err));\n\
             \x20           return;\n\
             \x20       }}\n\
             \x20       client::call_checked(\n\
             \x20           &self.channel,\n\
             \x20           &self.dispatcher,\n\
             \x20           {base}_IDS,\n\
             \x20           &body,\n\
             \x20           move |outcome| {{\n\
             \x20               let result = outcome.and_then(|response| match response.status {{\n\
             \x20                   Status::Ok => decode_{fn_base}_response(&response.body),\n\
             \x20                   status => Err(client::status_error(status)),\n\
             \x20               }});\n\
             \x20               callback(result);\n\
             \x20           }},\n\
             \x20       );\n\
             \x20   }}\n"
        );

        // Async shape: future fulfilled exactly once.
        let _ = writeln!(
            out,
            "    pub fn {method_snake}_async(&self{sep}{params}) -> PendingReply<{result}> {{\n\
             \x20       let (slot, reply) = PendingReply::channel();\n\
             \x20       self.{method_snake}({arg_names}{arg_sep}move |result| slot.fulfill(result));\n\
             \x20       reply\n\
             \x20   }}\n"
        );

        // Sync shape: blocks until the response arrives.
        let _ = writeln!(
            out,
            "    pub fn {method_snake}_sync(&self{sep}{params}) -> Result<{result}> {{\n\
             \x20       self.{method_snake}_async({arg_names}).wait()\n\
             \x20   }}\n"
        );
    }
    out.push_str("}\n\n");

    let _ = writeln!(
        out,
        "pub fn make_{iface_snake}_client(\n\
         \x20   channel: Arc<dyn Channel>,\n\
         \x20   dispatcher: Arc<Dispatcher>,\n\
         ) -> {client_name} {{\n\
         \x20   {client_name}::new(channel, dispatcher)\n\
         }}\n"
    );
}

#[cfg(test)]
#[path = "../tests/t_codegen.rs"]
mod tests;
