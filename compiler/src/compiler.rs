use brine_idl_schema::SchemaDocument;
use crate::{
    verifier::verify_schema,
    parser::parse_schema,
    error::IdlError,
};

/// Compile a textual schema into an immutable `SchemaDocument`.
/// Returns `Err(IdlError)` if parsing or range verification fails.
pub fn compile_schema(text: &str) -> Result<SchemaDocument, IdlError> {
    let schema = parse_schema(text)?;
    verify_schema(&schema)?;

    tracing::debug!(
        structs = schema.structs().count(),
        enums   = schema.enums().count(),
        "compiled schema"
    );
    Ok(schema)
}
