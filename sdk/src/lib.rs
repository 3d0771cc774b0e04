//! brine-idl
//!
//! Runtime support for schema-driven binary payloads.
//!
//! - `compile_schema` (re-exported from the compiler)
//! - Type resolution and value validation against a compiled schema
//! - `encode` / `decode` between `Value` trees and bytes
//! - `SharedSchema` for swapping a schema under concurrent readers
//!
//! ```
//! use brine_idl::{compile_schema, decode, encode, Value};
//!
//! let schema = compile_schema("struct P { int8[-5,5] x; bool ok; string name; }").unwrap();
//! let value = Value::from_json_str(r#"{"x": 3, "ok": true, "name": "hi"}"#).unwrap();
//!
//! let bytes = encode(&schema, "P", &value).unwrap();
//! assert_eq!(bytes, [0x03, 0x01, 0x02, 0x68, 0x69]);
//!
//! let (decoded, end) = decode(&schema, "P", &bytes, 0).unwrap();
//! assert_eq!(decoded, value);
//! assert_eq!(end, bytes.len());
//! ```

pub mod codec;
pub mod limits;
pub mod resolver;
pub mod shared;
pub mod validator;

pub use brine_idl_compiler::{compile_schema, IdlError};
pub use brine_idl_schema::{EnumDef, FieldDef, SchemaDocument, StructDef, TypeRef, Value};
pub use codec::{decode, encode, Codec};
pub use limits::CodecLimits;
pub use resolver::{resolve, resolve_token, TypeDescriptor};
pub use shared::SharedSchema;
pub use validator::validate;

pub mod error {
    pub use brine_idl_compiler::error::IdlError;
}

pub mod schema {
    pub use brine_idl_schema::*;
}
