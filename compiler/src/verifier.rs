use brine_idl_schema::{IntKind, IntRange, SchemaDocument, TypeRef};
use crate::{error::IdlError, utils::quote};

/// Returns `Ok(())` if verification passed, or `Err(IdlError::SchemaRange { .. })`
/// naming the first field whose declared range is unusable.
///
/// Named types are not checked; they resolve when a value of the field's
/// type is encoded or decoded.
pub fn verify_schema(schema: &SchemaDocument) -> Result<(), IdlError> {
    for def in schema.structs() {
        for field in &def.fields {
            if let TypeRef::SizedInteger { int, range: Some(range) } = field.ty {
                check_range(&format!("{}.{}", def.name, field.name), int, range)?;
            }
        }
    }

    Ok(())
}

/// Checks that a declared range is ordered and fits the width of `int`.
pub fn check_range(field: &str, int: IntKind, range: IntRange) -> Result<(), IdlError> {
    if range.min > range.max {
        return Err(IdlError::SchemaRange {
            field: field.to_owned(),
            msg:   format!("min {} is greater than max {}", range.min, range.max),
        });
    }

    let intrinsic = int.intrinsic_range();
    if !range.is_within(&intrinsic) {
        return Err(IdlError::SchemaRange {
            field: field.to_owned(),
            msg:   format!(
                "declared range {} exceeds the bounds {} of {}",
                range,
                intrinsic,
                quote(int.keyword())
            ),
        });
    }

    Ok(())
}
