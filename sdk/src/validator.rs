//! Acceptance checks for runtime values against resolved types.

use brine_idl_compiler::IdlError;
use brine_idl_schema::Value;

use crate::resolver::TypeDescriptor;

/// Checks `value` against `descriptor`, failing with a `Validation` error at
/// `path`.
///
/// Structs are only checked for being objects here; their members are
/// validated as the nested struct is encoded. `any` accepts everything.
pub fn validate(descriptor: &TypeDescriptor, value: &Value, path: &str) -> Result<(), IdlError> {
    let accepted = match *descriptor {
        TypeDescriptor::Bool => matches!(value, Value::Bool(_)),
        TypeDescriptor::Utf8String => matches!(value, Value::String(_)),
        TypeDescriptor::Float32 | TypeDescriptor::Float64 => value.is_number(),
        TypeDescriptor::AnyJson => true,
        TypeDescriptor::SizedInteger { int, range } => {
            let range = range.unwrap_or_else(|| int.intrinsic_range());
            value.as_i64().is_some_and(|n| range.contains(n))
        }
        TypeDescriptor::Enum(def) => match value {
            Value::String(name) => def.value_of(name).is_some(),
            _ => value.as_i64().is_some_and(|code| def.name_of(code).is_some()),
        },
        TypeDescriptor::Struct(_) => matches!(value, Value::Object(_)),
    };

    if accepted {
        Ok(())
    } else {
        Err(mismatch(descriptor, value, path))
    }
}

pub(crate) fn mismatch(descriptor: &TypeDescriptor, value: &Value, path: &str) -> IdlError {
    IdlError::Validation {
        path:     path.to_owned(),
        expected: descriptor.describe(),
        actual:   describe_value(value),
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value.kind_name().to_owned(),
        Value::Float(f) if !f.is_finite() => f.to_string(),
        _ => value.to_json_string(),
    }
}
