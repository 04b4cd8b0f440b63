//! HB1 message encoding: a flat sequence of `(tag, wire type, value)`
//! triples.
//!
//! Each field is written as `varint(field id) | u8(wire type) | value`.
//! The codec writes no outer length; the enclosing frame bounds the
//! message. Unknown tags are skipped on decode so readers with older
//! descriptors keep working.

use crate::runtime::error::{Result, RuntimeError};

pub const MAX_VARINT_BYTES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    ZigZagVarint = 1,
    Fixed32 = 2,
    Fixed64 = 3,
    LengthDelimited = 4,
    /// Reserved; encode and decode both fail with `Unimplemented`.
    Capability = 5,
}

impl WireType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WireType::Varint),
            1 => Some(WireType::ZigZagVarint),
            2 => Some(WireType::Fixed32),
            3 => Some(WireType::Fixed64),
            4 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Capability),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Unsigned,
    Signed,
    String,
    Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unsigned(_) => ValueKind::Unsigned,
            Value::Signed(_) => ValueKind::Signed,
            Value::Str(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Value::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_signed(&self) -> Option<i64> {
        match self {
            Value::Signed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_unsigned(self) -> Result<u64> {
        match self {
            Value::Unsigned(v) => Ok(v),
            _ => Err(RuntimeError::internal("value kind mismatch")),
        }
    }

    pub fn into_signed(self) -> Result<i64> {
        match self {
            Value::Signed(v) => Ok(v),
            _ => Err(RuntimeError::internal("value kind mismatch")),
        }
    }

    pub fn into_string(self) -> Result<String> {
        match self {
            Value::Str(v) => Ok(v),
            _ => Err(RuntimeError::internal("value kind mismatch")),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Value::Bytes(v) => Ok(v),
            _ => Err(RuntimeError::internal("value kind mismatch")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub id: u32,
    pub wire_type: WireType,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: u32,
    pub wire_type: WireType,
    pub optional: bool,
    pub preferred_kind: ValueKind,
}

#[derive(Debug, Clone, Copy)]
pub struct MessageDescriptor<'a> {
    pub fields: &'a [FieldDescriptor],
}

impl<'a> MessageDescriptor<'a> {
    pub fn field(&self, id: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.id == id)
    }
}

// -- Writer --

pub struct Writer<'a> {
    sink: &'a mut Vec<u8>,
}

impl<'a> Writer<'a> {
    pub fn new(sink: &'a mut Vec<u8>) -> Self {
        Writer { sink }
    }

    pub fn write_varint(&mut self, value: u64) {
        write_varint(self.sink, value);
    }

    pub fn write_zigzag(&mut self, value: i64) {
        self.write_varint(zigzag_encode(value));
    }

    fn write_tag(&mut self, tag: u32, wire_type: WireType) {
        self.write_varint(u64::from(tag));
        self.sink.push(wire_type as u8);
    }

    pub fn write_field_varint(&mut self, tag: u32, value: u64) {
        self.write_tag(tag, WireType::Varint);
        self.write_varint(value);
    }

    pub fn write_field_svarint(&mut self, tag: u32, value: i64) {
        self.write_tag(tag, WireType::ZigZagVarint);
        self.write_zigzag(value);
    }

    pub fn write_field_fixed32(&mut self, tag: u32, value: u32) {
        self.write_tag(tag, WireType::Fixed32);
        self.sink.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_field_fixed64(&mut self, tag: u32, value: u64) {
        self.write_tag(tag, WireType::Fixed64);
        self.sink.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_field_bytes(&mut self, tag: u32, bytes: &[u8]) {
        self.write_tag(tag, WireType::LengthDelimited);
        self.write_varint(bytes.len() as u64);
        self.sink.extend_from_slice(bytes);
    }

    pub fn write_field_string(&mut self, tag: u32, value: &str) {
        self.write_field_bytes(tag, value.as_bytes());
    }
}

pub fn write_varint(sink: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        sink.push((value as u8) | 0x80);
        value >>= 7;
    }
    sink.push(value as u8);
}

pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

// -- Reader --

/// One decoded field as seen on the wire; `data` borrows from the input.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    pub id: u32,
    pub wire_type: WireType,
    pub data: &'a [u8],
}

pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_exact(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(RuntimeError::transport("unexpected end of payload"));
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        for _ in 0..MAX_VARINT_BYTES {
            if self.is_empty() {
                return Err(RuntimeError::transport("truncated varint"));
            }
            let byte = self.data[self.pos];
            self.pos += 1;
            result |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(RuntimeError::transport("varint too long"))
    }

    /// Reads the next `(tag, wire type, value)` triple, or `None` at end of
    /// input. The raw varint bytes are returned unparsed for varint-typed
    /// fields so the caller can decode with the intended signedness.
    pub fn next_field(&mut self) -> Result<Option<FieldView<'a>>> {
        if self.is_empty() {
            return Ok(None);
        }

        let tag = self.read_varint()?;
        let type_byte = self.read_byte()?;
        let wire_type = WireType::from_u8(type_byte)
            .ok_or_else(|| RuntimeError::transport("unknown wire type"))?;

        let data = match wire_type {
            WireType::Varint | WireType::ZigZagVarint => {
                let start = self.pos;
                self.read_varint()?;
                &self.data[start..self.pos]
            }
            WireType::Fixed32 => self.read_exact(4)?,
            WireType::Fixed64 => self.read_exact(8)?,
            WireType::LengthDelimited => {
                let len = self.read_varint()?;
                self.read_exact(len as usize)?
            }
            WireType::Capability => {
                return Err(RuntimeError::unimplemented(
                    "capability decoding not implemented",
                ));
            }
        };

        Ok(Some(FieldView {
            id: tag as u32,
            wire_type,
            data,
        }))
    }
}

pub fn decode_varint(data: &[u8]) -> Result<u64> {
    let mut reader = Reader::new(data);
    reader.read_varint()
}

pub fn decode_zigzag(data: &[u8]) -> Result<i64> {
    Ok(zigzag_decode(decode_varint(data)?))
}

// -- Message level --

/// Encodes `values` in input order, checking each against the descriptor:
/// unknown field ids and wire-type or value-kind disagreements are
/// internal errors, never silently re-encoded.
pub fn encode_message(
    descriptor: &MessageDescriptor<'_>,
    values: &[FieldValue],
    writer: &mut Writer<'_>,
) -> Result<()> {
    for field in values {
        let desc = descriptor
            .field(field.id)
            .ok_or_else(|| RuntimeError::internal("unknown field id in encode_message"))?;
        if desc.wire_type != field.wire_type {
            return Err(RuntimeError::internal("wire type mismatch in encode_message"));
        }
        if desc.wire_type == WireType::LengthDelimited {
            if desc.preferred_kind == ValueKind::String
                && field.value.kind() != ValueKind::String
            {
                return Err(RuntimeError::internal(
                    "length-delimited field expects string",
                ));
            }
            if desc.preferred_kind == ValueKind::Bytes && field.value.kind() != ValueKind::Bytes
            {
                return Err(RuntimeError::internal(
                    "length-delimited field expects bytes",
                ));
            }
        }
        encode_value(field, writer)?;
    }
    Ok(())
}

fn encode_value(field: &FieldValue, writer: &mut Writer<'_>) -> Result<()> {
    match field.wire_type {
        WireType::Varint => {
            let value = field
                .value
                .as_unsigned()
                .ok_or_else(|| RuntimeError::internal("value kind mismatch"))?;
            writer.write_field_varint(field.id, value);
        }
        WireType::ZigZagVarint => {
            let value = field
                .value
                .as_signed()
                .ok_or_else(|| RuntimeError::internal("value kind mismatch"))?;
            writer.write_field_svarint(field.id, value);
        }
        WireType::Fixed32 => {
            let value = field
                .value
                .as_unsigned()
                .ok_or_else(|| RuntimeError::internal("value kind mismatch"))?;
            writer.write_field_fixed32(field.id, value as u32);
        }
        WireType::Fixed64 => {
            let value = field
                .value
                .as_unsigned()
                .ok_or_else(|| RuntimeError::internal("value kind mismatch"))?;
            writer.write_field_fixed64(field.id, value);
        }
        WireType::LengthDelimited => match &field.value {
            Value::Str(text) => writer.write_field_string(field.id, text),
            Value::Bytes(bytes) => writer.write_field_bytes(field.id, bytes),
            _ => {
                return Err(RuntimeError::internal(
                    "length-delimited field requires string/bytes",
                ));
            }
        },
        WireType::Capability => {
            return Err(RuntimeError::unimplemented(
                "capability encoding not implemented",
            ));
        }
    }
    Ok(())
}

/// Decodes fields until the reader is exhausted. Fields without a
/// descriptor entry are skipped; afterwards every non-optional descriptor
/// field must have appeared.
pub fn decode_message(
    descriptor: &MessageDescriptor<'_>,
    reader: &mut Reader<'_>,
) -> Result<Vec<FieldValue>> {
    let mut values = Vec::new();

    while let Some(view) = reader.next_field()? {
        let Some(desc) = descriptor.field(view.id) else {
            continue; // unknown fields ignored
        };

        let value = match view.wire_type {
            WireType::Varint => Value::Unsigned(decode_varint(view.data)?),
            WireType::ZigZagVarint => Value::Signed(decode_zigzag(view.data)?),
            WireType::Fixed32 => {
                if view.data.len() != 4 {
                    return Err(RuntimeError::transport("fixed32 length mismatch"));
                }
                let v = u32::from_be_bytes([view.data[0], view.data[1], view.data[2], view.data[3]]);
                Value::Unsigned(u64::from(v))
            }
            WireType::Fixed64 => {
                if view.data.len() != 8 {
                    return Err(RuntimeError::transport("fixed64 length mismatch"));
                }
                let mut v = 0u64;
                for byte in view.data {
                    v = (v << 8) | u64::from(*byte);
                }
                Value::Unsigned(v)
            }
            WireType::LengthDelimited => {
                if desc.preferred_kind == ValueKind::String {
                    let text = String::from_utf8_lossy(view.data).into_owned();
                    Value::Str(text)
                } else {
                    Value::Bytes(view.data.to_vec())
                }
            }
            WireType::Capability => {
                return Err(RuntimeError::unimplemented(
                    "capability decoding not implemented",
                ));
            }
        };

        values.push(FieldValue {
            id: view.id,
            wire_type: view.wire_type,
            value,
        });
    }

    for desc in descriptor.fields {
        if desc.optional {
            continue;
        }
        if !values.iter().any(|value| value.id == desc.id) {
            return Err(RuntimeError::transport("missing required field"));
        }
    }

    Ok(values)
}

/// Convenience wrapper decoding a whole byte slice.
pub fn decode_message_bytes(
    descriptor: &MessageDescriptor<'_>,
    data: &[u8],
) -> Result<Vec<FieldValue>> {
    let mut reader = Reader::new(data);
    decode_message(descriptor, &mut reader)
}

#[cfg(test)]
#[path = "../tests/t_hb1.rs"]
mod tests;
