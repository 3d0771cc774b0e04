//! brine-idl-compiler
//!
//! This crate implements:
//!  1) A parser for the struct/enum schema language (comment stripping,
//!     brace-matched struct bodies, inline and global enums, ranged integers),
//!  2) A verifier for declared integer ranges,
//!  3) `compile_schema`, the text → `SchemaDocument` entry point,
//!  4) Error types (`IdlError`).

pub mod error;
pub mod utils;
pub mod parser;
pub mod verifier;
pub mod compiler;

pub use compiler::compile_schema;
pub use error::IdlError;
pub use parser::parse_type_token;
