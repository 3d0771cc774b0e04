//! Resolution of declared field types to concrete descriptors.

use brine_idl_compiler::{parse_type_token, utils::quote, verifier::check_range, IdlError};
use brine_idl_schema::{EnumDef, IntKind, IntRange, SchemaDocument, StructDef, TypeRef};

/// A field type with every name looked up.
///
/// Enum and struct variants borrow their definitions from the schema, so a
/// descriptor never outlives the `SchemaDocument` it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeDescriptor<'s> {
    Bool,
    Utf8String,
    Float32,
    Float64,
    AnyJson,
    SizedInteger {
        int:   IntKind,
        range: Option<IntRange>,
    },
    Enum(&'s EnumDef),
    Struct(&'s StructDef),
}

impl TypeDescriptor<'_> {
    /// Human-readable form used as the "expected" part of validation errors.
    pub fn describe(&self) -> String {
        match self {
            TypeDescriptor::Bool => "bool".to_owned(),
            TypeDescriptor::Utf8String => "string".to_owned(),
            TypeDescriptor::Float32 => "float32".to_owned(),
            TypeDescriptor::Float64 => "float64".to_owned(),
            TypeDescriptor::AnyJson => "any".to_owned(),
            TypeDescriptor::SizedInteger { int, range } => {
                let range = range.unwrap_or_else(|| int.intrinsic_range());
                format!("{} in range {}", int.keyword(), range)
            }
            TypeDescriptor::Enum(def) => format!("member of enum {}", def.name),
            TypeDescriptor::Struct(def) => format!("struct {}", def.name),
        }
    }
}

/// Resolves `ty` as seen from inside `scope`.
///
/// Bare names are looked up in the scope's local enums, then the global
/// enums, then the struct registry.
pub fn resolve<'s>(
    doc: &'s SchemaDocument,
    scope: Option<&'s StructDef>,
    ty: &TypeRef,
) -> Result<TypeDescriptor<'s>, IdlError> {
    let descriptor = match ty {
        TypeRef::Bool => TypeDescriptor::Bool,
        TypeRef::Utf8String => TypeDescriptor::Utf8String,
        TypeRef::Float32 => TypeDescriptor::Float32,
        TypeRef::Float64 => TypeDescriptor::Float64,
        TypeRef::AnyJson => TypeDescriptor::AnyJson,
        TypeRef::SizedInteger { int, range } => TypeDescriptor::SizedInteger {
            int:   *int,
            range: *range,
        },
        TypeRef::Named { name } => {
            if let Some(def) = scope.and_then(|s| s.local_enum(name)) {
                TypeDescriptor::Enum(def)
            } else if let Some(def) = doc.global_enum(name) {
                TypeDescriptor::Enum(def)
            } else if let Some(def) = doc.struct_def(name) {
                TypeDescriptor::Struct(def)
            } else {
                return Err(IdlError::UnknownType {
                    name:  name.clone(),
                    scope: scope.map_or_else(
                        || "global scope".to_owned(),
                        |s| format!("struct {}", quote(&s.name)),
                    ),
                });
            }
        }
    };
    Ok(descriptor)
}

/// Resolves raw type-token text such as `uint8[0,200]` or `Color`.
pub fn resolve_token<'s>(
    doc: &'s SchemaDocument,
    scope: Option<&'s StructDef>,
    token: &str,
) -> Result<TypeDescriptor<'s>, IdlError> {
    let ty = parse_type_token(token)?;
    if let TypeRef::SizedInteger { int, range: Some(range) } = ty {
        check_range(token.trim(), int, range)?;
    }
    resolve(doc, scope, &ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brine_idl_compiler::compile_schema;

    const SCHEMA: &str = r#"
        enum Mode { OFF; ON; }
        struct Device {
            enum Mode { IDLE = 3; BUSY; }
            Mode mode;
            Port port;
        }
        struct Port { uint16 number; }
        struct Mode { bool unused; }
    "#;

    #[test]
    fn local_enum_shadows_global() {
        let doc = compile_schema(SCHEMA).unwrap();
        let device = doc.struct_def("Device").unwrap();

        match resolve_token(&doc, Some(device), "Mode").unwrap() {
            TypeDescriptor::Enum(def) => assert_eq!(def.value_of("IDLE"), Some(3)),
            other => panic!("expected the local enum but got {:?}", other),
        }

        let port = doc.struct_def("Port").unwrap();
        match resolve_token(&doc, Some(port), "Mode").unwrap() {
            TypeDescriptor::Enum(def) => assert_eq!(def.value_of("ON"), Some(1)),
            other => panic!("expected the global enum but got {:?}", other),
        }
    }

    #[test]
    fn enums_win_over_structs() {
        let doc = compile_schema(SCHEMA).unwrap();
        assert!(matches!(resolve_token(&doc, None, "Mode").unwrap(), TypeDescriptor::Enum(_)));
        assert!(matches!(resolve_token(&doc, None, "Port").unwrap(), TypeDescriptor::Struct(_)));
    }

    #[test]
    fn keywords_resolve_before_names() {
        let doc = compile_schema(SCHEMA).unwrap();
        assert_eq!(resolve_token(&doc, None, "float").unwrap(), TypeDescriptor::Float64);
        assert_eq!(
            resolve_token(&doc, None, "uint8[0,200]").unwrap(),
            TypeDescriptor::SizedInteger { int: IntKind::UInt8, range: Some(IntRange::new(0, 200)) }
        );
    }

    #[test]
    fn unknown_names_fail() {
        let doc = compile_schema(SCHEMA).unwrap();
        let device = doc.struct_def("Device").unwrap();
        match resolve_token(&doc, Some(device), "Missing") {
            Err(IdlError::UnknownType { name, scope }) => {
                assert_eq!(name, "Missing");
                assert_eq!(scope, "struct \"Device\"");
            }
            other => panic!("expected an UnknownType error but got {:?}", other),
        }
    }

    #[test]
    fn token_ranges_are_checked() {
        let doc = compile_schema(SCHEMA).unwrap();
        assert!(matches!(
            resolve_token(&doc, None, "uint8[0,300]"),
            Err(IdlError::SchemaRange { .. })
        ));
    }
}
