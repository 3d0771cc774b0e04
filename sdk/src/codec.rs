//! Schema-driven encoding and decoding of value trees.
//!
//! A struct is written as the concatenation of its fields in declaration
//! order, with no envelope:
//!
//! - sized integers: little-endian two's complement, 1/2/4 bytes
//! - `bool`: one byte, 0 or 1
//! - `float32`/`float64`: raw little-endian IEEE-754
//! - enums: LEB128 varint of the member's code
//! - `string`/`any`: LEB128 byte length then UTF-8 bytes (`any` as JSON text)
//! - nested structs: LEB128 byte length then the nested encoding
//!
//! Fields missing from the value and without a default are left out
//! entirely. When decoding, running out of input before a field starts ends
//! the struct, and the remaining fields are simply absent.
//!
//! Nothing on the wire marks which fields were left out, so omission is only
//! safe for trailing fields. Dropping a middle field makes the decoder read
//! the next field's bytes in its place.

use std::collections::BTreeMap;

use brine_idl_compiler::IdlError;
use brine_idl_schema::{ByteBuffer, ByteBufferMut, IntKind, SchemaDocument, StructDef, Value};

use crate::{
    limits::CodecLimits,
    resolver::{resolve, TypeDescriptor},
    validator::{mismatch, validate},
};

/// Bytes in the longest LEB128 encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Encodes and decodes values against one compiled schema.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'s> {
    doc:    &'s SchemaDocument,
    limits: CodecLimits,
}

impl<'s> Codec<'s> {
    pub fn new(doc: &'s SchemaDocument) -> Codec<'s> {
        Codec {
            doc,
            limits: CodecLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: CodecLimits) -> Codec<'s> {
        self.limits = limits;
        self
    }

    pub fn schema(&self) -> &'s SchemaDocument {
        self.doc
    }

    pub fn limits(&self) -> CodecLimits {
        self.limits
    }

    /// Encodes `value` as the struct `name`.
    ///
    /// Values are validated and flattened into chunks first, so every nested
    /// length is known before the first byte is written.
    pub fn encode(&self, name: &str, value: &Value) -> Result<Vec<u8>, IdlError> {
        let def = self.struct_def(name)?;
        let mut chunks = Vec::new();
        let len = self.encode_struct(def, value, name, 0, &mut chunks)?;

        let mut bb = ByteBufferMut::with_capacity(len);
        for chunk in &chunks {
            chunk.write(&mut bb);
        }

        let bytes = bb.data();
        tracing::debug!(struct_name = name, bytes = bytes.len(), "encoded struct");
        Ok(bytes)
    }

    /// Decodes the struct `name` from `bytes` starting at `offset`.
    ///
    /// Returns the value and the offset just past the consumed bytes. Bytes
    /// after the struct are left untouched.
    pub fn decode(&self, name: &str, bytes: &[u8], offset: usize) -> Result<(Value, usize), IdlError> {
        let def = self.struct_def(name)?;
        let mut bb = ByteBuffer::new_at(bytes, offset);
        let value = self.decode_struct(def, &mut bb, name, 0)?;

        tracing::debug!(struct_name = name, offset = offset, end = bb.index(), "decoded struct");
        Ok((value, bb.index()))
    }

    fn struct_def(&self, name: &str) -> Result<&'s StructDef, IdlError> {
        self.doc
            .struct_def(name)
            .ok_or_else(|| IdlError::UnknownStruct(name.to_owned()))
    }

    fn check_depth(&self, depth: usize, path: &str) -> Result<(), IdlError> {
        if depth > self.limits.max_depth {
            return Err(IdlError::DepthLimitExceeded {
                path:  path.to_owned(),
                limit: self.limits.max_depth,
            });
        }
        Ok(())
    }

    /// Appends the chunks of one struct to `out` and returns their encoded
    /// size, nested bodies included.
    fn encode_struct(
        &self,
        def: &'s StructDef,
        value: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<Chunk>,
    ) -> Result<usize, IdlError> {
        self.check_depth(depth, path)?;

        let fields = value
            .as_object()
            .ok_or_else(|| mismatch(&TypeDescriptor::Struct(def), value, path))?;

        let mut len = 0;
        for field in &def.fields {
            let field_path = format!("{}.{}", path, field.name);

            let descriptor;
            let lifted;
            let field_value = match (fields.get(&field.name), &field.default) {
                (Some(supplied), _) => {
                    descriptor = resolve(self.doc, Some(def), &field.ty)?;
                    supplied
                }
                (None, Some(raw)) => {
                    descriptor = resolve(self.doc, Some(def), &field.ty)?;
                    lifted = default_value(&descriptor, raw);
                    &lifted
                }
                (None, None) => {
                    tracing::trace!(path = %field_path, "field omitted");
                    continue;
                }
            };

            validate(&descriptor, field_value, &field_path)?;
            let field_len = self.encode_value(&descriptor, field_value, &field_path, depth, out)?;
            tracing::trace!(path = %field_path, len = field_len, "field encoded");
            len += field_len;
        }

        Ok(len)
    }

    fn encode_value(
        &self,
        descriptor: &TypeDescriptor<'s>,
        value: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<Chunk>,
    ) -> Result<usize, IdlError> {
        let invalid = || mismatch(descriptor, value, path);

        let chunk = match *descriptor {
            TypeDescriptor::SizedInteger { int, .. } => Chunk::Fixed {
                value: value.as_i64().ok_or_else(invalid)?,
                width: int.width(),
            },
            TypeDescriptor::Utf8String => {
                let text = value.as_str().ok_or_else(invalid)?;
                self.check_length(text.len(), path)?;
                Chunk::Bytes(text.as_bytes().to_vec())
            }
            TypeDescriptor::AnyJson => {
                let text = value.to_json_string();
                self.check_length(text.len(), path)?;
                Chunk::Bytes(text.into_bytes())
            }
            TypeDescriptor::Bool => Chunk::Bool(value.as_bool().ok_or_else(invalid)?),
            TypeDescriptor::Float32 => Chunk::Float32(value.as_f64().ok_or_else(invalid)? as f32),
            TypeDescriptor::Float64 => Chunk::Float64(value.as_f64().ok_or_else(invalid)?),
            TypeDescriptor::Enum(def) => {
                let code = match value {
                    Value::String(name) => def.value_of(name),
                    _ => value.as_i64(),
                }
                .ok_or_else(invalid)?;
                // Negative codes travel as their 64-bit two's complement
                Chunk::Varint(code as u64)
            }
            TypeDescriptor::Struct(def) => {
                let slot = out.len();
                out.push(Chunk::Nested(0));
                let inner = self.encode_struct(def, value, path, depth + 1, out)?;
                self.check_length(inner, path)?;
                out[slot] = Chunk::Nested(inner);
                return Ok(ByteBufferMut::var_uint64_len(inner as u64) + inner);
            }
        };

        let len = chunk.encoded_len();
        out.push(chunk);
        Ok(len)
    }

    fn check_length(&self, len: usize, path: &str) -> Result<(), IdlError> {
        if len > self.limits.max_length {
            return Err(IdlError::LengthLimitExceeded {
                path:     path.to_owned(),
                declared: len as u64,
                limit:    self.limits.max_length,
            });
        }
        Ok(())
    }

    fn decode_struct(
        &self,
        def: &'s StructDef,
        bb: &mut ByteBuffer,
        path: &str,
        depth: usize,
    ) -> Result<Value, IdlError> {
        self.check_depth(depth, path)?;

        let mut fields = BTreeMap::new();
        for field in &def.fields {
            if bb.is_at_end() {
                tracing::trace!(owner = %def.name, field = %field.name, "input exhausted");
                break;
            }

            let field_path = format!("{}.{}", path, field.name);
            let descriptor = resolve(self.doc, Some(def), &field.ty)?;
            let value = self.decode_value(&descriptor, bb, &field_path, depth)?;
            fields.insert(field.name.clone(), value);
        }

        Ok(Value::Object(fields))
    }

    fn decode_value(
        &self,
        descriptor: &TypeDescriptor<'s>,
        bb: &mut ByteBuffer,
        path: &str,
        depth: usize,
    ) -> Result<Value, IdlError> {
        let value = match *descriptor {
            TypeDescriptor::SizedInteger { int, .. } => {
                let remaining = bb.remaining();
                let n = match int {
                    IntKind::Int8 => bb.read_i8().map(i64::from),
                    IntKind::UInt8 => bb.read_u8().map(i64::from),
                    IntKind::Int16 => bb.read_i16().map(i64::from),
                    IntKind::UInt16 => bb.read_u16().map(i64::from),
                    IntKind::Int32 => bb.read_i32().map(i64::from),
                    IntKind::UInt32 => bb.read_u32().map(i64::from),
                }
                .map_err(|_| truncated(path, int.width(), remaining))?;
                Value::Int(n)
            }
            TypeDescriptor::Utf8String => {
                let bytes = self.read_length_prefixed(bb, path)?;
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
            TypeDescriptor::AnyJson => {
                let bytes = self.read_length_prefixed(bb, path)?;
                let text = std::str::from_utf8(bytes).map_err(|e| malformed(path, e))?;
                Value::from_json_str(text).map_err(|e| malformed(path, e))?
            }
            TypeDescriptor::Bool => match bb.read_byte() {
                Ok(0) => Value::Bool(false),
                Ok(1) => Value::Bool(true),
                Ok(other) => return Err(malformed(path, format!("invalid bool byte {}", other))),
                Err(()) => return Err(truncated(path, 1, 0)),
            },
            TypeDescriptor::Float32 => {
                let remaining = bb.remaining();
                let f = bb.read_f32().map_err(|_| truncated(path, 4, remaining))?;
                Value::Float(f as f64)
            }
            TypeDescriptor::Float64 => {
                let remaining = bb.remaining();
                let f = bb.read_f64().map_err(|_| truncated(path, 8, remaining))?;
                Value::Float(f)
            }
            TypeDescriptor::Enum(def) => {
                let code = self.read_varint(bb, path)? as i64;
                match def.name_of(code) {
                    Some(name) => Value::String(name.to_owned()),
                    None => Value::Int(code),
                }
            }
            TypeDescriptor::Struct(def) => {
                let bytes = self.read_length_prefixed(bb, path)?;
                let mut inner = ByteBuffer::new(bytes);
                self.decode_struct(def, &mut inner, path, depth + 1)?
            }
        };

        Ok(value)
    }

    fn read_varint(&self, bb: &mut ByteBuffer, path: &str) -> Result<u64, IdlError> {
        let start = bb.index();
        let remaining = bb.remaining();
        bb.read_var_uint64().map_err(|_| {
            // A failure after the longest legal encoding is an overflow
            if bb.index() - start >= MAX_VARINT_LEN {
                malformed(path, "varint does not fit in 64 bits")
            } else {
                truncated(path, remaining + 1, remaining)
            }
        })
    }

    /// Reads a LEB128 length and then that many bytes, refusing lengths over
    /// the configured limit or past the end of the input.
    fn read_length_prefixed<'b>(&self, bb: &mut ByteBuffer<'b>, path: &str) -> Result<&'b [u8], IdlError> {
        let declared = self.read_varint(bb, path)?;
        if declared > self.limits.max_length as u64 {
            return Err(IdlError::LengthLimitExceeded {
                path: path.to_owned(),
                declared,
                limit: self.limits.max_length,
            });
        }

        let len = declared as usize;
        let remaining = bb.remaining();
        bb.read_bytes(len).map_err(|_| truncated(path, len, remaining))
    }
}

/// Encodes `value` as the struct `struct_name` with default limits.
pub fn encode(doc: &SchemaDocument, struct_name: &str, value: &Value) -> Result<Vec<u8>, IdlError> {
    Codec::new(doc).encode(struct_name, value)
}

/// Decodes the struct `struct_name` from `bytes` at `offset` with default
/// limits. Returns the value and the offset just past it.
pub fn decode(doc: &SchemaDocument, struct_name: &str, bytes: &[u8], offset: usize) -> Result<(Value, usize), IdlError> {
    Codec::new(doc).decode(struct_name, bytes, offset)
}

/// Lifts a raw default literal to a value for a field of type `descriptor`.
///
/// String fields take the literal as text, unquoting it when it is a JSON
/// string. Other fields read it as a JSON literal and fall back to the bare
/// text, so `RED` names an enum member.
fn default_value(descriptor: &TypeDescriptor, raw: &str) -> Value {
    match descriptor {
        TypeDescriptor::Utf8String => match Value::from_json_str(raw) {
            Ok(Value::String(text)) => Value::String(text),
            _ => Value::String(raw.to_owned()),
        },
        _ => Value::from_json_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned())),
    }
}

/// One run of output bytes, recorded before the final buffer is sized.
#[derive(Debug)]
enum Chunk {
    Fixed { value: i64, width: usize },
    Bool(bool),
    Float32(f32),
    Float64(f64),
    Varint(u64),
    /// Length-prefixed payload
    Bytes(Vec<u8>),
    /// Length prefix of a nested struct whose chunks follow
    Nested(usize),
}

impl Chunk {
    fn encoded_len(&self) -> usize {
        match self {
            Chunk::Fixed { width, .. } => *width,
            Chunk::Bool(_) => 1,
            Chunk::Float32(_) => 4,
            Chunk::Float64(_) => 8,
            Chunk::Varint(v) => ByteBufferMut::var_uint64_len(*v),
            Chunk::Bytes(bytes) => ByteBufferMut::var_uint64_len(bytes.len() as u64) + bytes.len(),
            Chunk::Nested(len) => ByteBufferMut::var_uint64_len(*len as u64),
        }
    }

    fn write(&self, bb: &mut ByteBufferMut) {
        match self {
            Chunk::Fixed { value, width } => bb.write_fixed_int(*value, *width),
            Chunk::Bool(b) => bb.write_bool(*b),
            Chunk::Float32(f) => bb.write_f32(*f),
            Chunk::Float64(f) => bb.write_f64(*f),
            Chunk::Varint(v) => bb.write_var_uint64(*v),
            Chunk::Bytes(bytes) => {
                bb.write_var_uint64(bytes.len() as u64);
                bb.write_bytes(bytes);
            }
            Chunk::Nested(len) => bb.write_var_uint64(*len as u64),
        }
    }
}

fn truncated(path: &str, needed: usize, remaining: usize) -> IdlError {
    IdlError::TruncatedInput {
        path: path.to_owned(),
        needed,
        remaining,
    }
}

fn malformed(path: &str, msg: impl ToString) -> IdlError {
    IdlError::Malformed {
        path: path.to_owned(),
        msg:  msg.to_string(),
    }
}
