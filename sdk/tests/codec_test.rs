#![cfg(test)]

use brine_idl::{compile_schema, decode, encode, Codec, CodecLimits, IdlError, SchemaDocument, Value};

const POINT: &str = "struct P { int8[-5,5] x; bool ok; string name; }";

const USERS: &str = r#"
    // Nested structs, declared after their first use
    struct User {
        uint8 id;
        Address address;
        bool active;
    }

    struct Address {
        string city;
        uint16 zip;
    }
"#;

fn obj(fields: Vec<(&str, Value)>) -> Value {
    fields.into_iter().collect()
}

fn json(text: &str) -> Value {
    Value::from_json_str(text).unwrap()
}

fn schema(text: &str) -> SchemaDocument {
    compile_schema(text).expect("compile_schema failed")
}

#[test]
fn test_scalar_struct_bytes() {
    let doc = schema(POINT);
    let value = json(r#"{"x": 3, "ok": true, "name": "hi"}"#);

    let bytes = encode(&doc, "P", &value).unwrap();
    assert_eq!(bytes, [0x03, 0x01, 0x02, 0x68, 0x69]);

    let (decoded, end) = decode(&doc, "P", &bytes, 0).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(end, 5);
}

#[test]
fn test_enum_by_name() {
    let doc = schema("enum Color{RED=1;GREEN=2;BLUE=3;} struct C { Color c; }");

    let bytes = encode(&doc, "C", &json(r#"{"c": "BLUE"}"#)).unwrap();
    assert_eq!(bytes, [0x03]);

    let (decoded, _) = decode(&doc, "C", &bytes, 0).unwrap();
    assert_eq!(decoded, json(r#"{"c": "BLUE"}"#));

    // Numeric codes pass through on encode and come back as names
    assert_eq!(encode(&doc, "C", &json(r#"{"c": 1}"#)).unwrap(), [0x01]);
    assert_eq!(decode(&doc, "C", &[0x01], 0).unwrap().0, json(r#"{"c": "RED"}"#));
}

#[test]
fn test_range_violation_reports_path() {
    let doc = schema(POINT);
    let err = encode(&doc, "P", &json(r#"{"x": 10, "ok": true, "name": "x"}"#)).unwrap_err();
    match err {
        IdlError::Validation { path, expected, actual } => {
            assert_eq!(path, "P.x");
            assert!(expected.contains("[-5,5]"), "{}", expected);
            assert_eq!(actual, "10");
        }
        other => panic!("expected a Validation error but got {:?}", other),
    }
}

#[test]
fn test_unknown_enum_code_passes_through() {
    let doc = schema("enum Color{RED=1;GREEN=2;BLUE=3;} struct C { Color c; }");
    let (decoded, end) = decode(&doc, "C", &[0x09], 0).unwrap();
    assert_eq!(decoded, obj(vec![("c", Value::Int(9))]));
    assert_eq!(end, 1);

    // Unknown codes are still refused on encode
    assert!(matches!(
        encode(&doc, "C", &obj(vec![("c", Value::Int(9))])),
        Err(IdlError::Validation { .. })
    ));
}

#[test]
fn test_absent_fields_are_omitted() {
    let doc = schema(POINT);

    let bytes = encode(&doc, "P", &json(r#"{"x": -5}"#)).unwrap();
    assert_eq!(bytes, [0xFB]);

    let (decoded, end) = decode(&doc, "P", &bytes, 0).unwrap();
    assert_eq!(decoded, json(r#"{"x": -5}"#));
    assert!(decoded.get("ok").is_none());
    assert!(decoded.get("name").is_none());
    assert_eq!(end, 1);

    assert_eq!(encode(&doc, "P", &Value::object()).unwrap(), Vec::<u8>::new());
    assert_eq!(decode(&doc, "P", &[], 0).unwrap(), (Value::object(), 0));
}

#[test]
fn test_nested_struct_framing() {
    let doc = schema(USERS);
    let value = json(r#"{"id": 7, "address": {"city": "Oslo", "zip": 513}, "active": false}"#);

    let bytes = encode(&doc, "User", &value).unwrap();
    assert_eq!(bytes, [7, 7, 4, b'O', b's', b'l', b'o', 0x01, 0x02, 0]);

    let (decoded, end) = decode(&doc, "User", &bytes, 0).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(end, bytes.len());
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let doc = schema(USERS);
    let value = json(r#"{"id": 1, "address": {"city": "", "zip": 0}, "active": true}"#);

    let mut bytes = encode(&doc, "User", &value).unwrap();
    let len = bytes.len();
    bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);

    let (decoded, end) = decode(&doc, "User", &bytes, 0).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(end, len);
}

#[test]
fn test_decode_at_offset() {
    let doc = schema(POINT);
    let value = json(r#"{"x": 0, "ok": false, "name": "z"}"#);

    let mut bytes = vec![0xEE, 0xEE];
    bytes.extend(encode(&doc, "P", &value).unwrap());

    let (decoded, end) = decode(&doc, "P", &bytes, 2).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(end, bytes.len());

    assert_eq!(decode(&doc, "P", &bytes, 100).unwrap(), (Value::object(), 100));
}

#[test]
fn test_nested_validation_path() {
    let doc = schema(USERS);
    let err = encode(&doc, "User", &json(r#"{"id": 1, "address": {"city": "Oslo", "zip": 70000}}"#)).unwrap_err();
    assert!(
        matches!(err, IdlError::Validation { ref path, .. } if path == "User.address.zip"),
        "{:?}",
        err
    );

    let err = encode(&doc, "User", &json(r#"{"address": [1, 2]}"#)).unwrap_err();
    assert!(
        matches!(err, IdlError::Validation { ref path, ref actual, .. } if path == "User.address" && actual == "array"),
        "{:?}",
        err
    );
}

#[test]
fn test_top_level_value_must_be_object() {
    let doc = schema(POINT);
    let err = encode(&doc, "P", &Value::Int(1)).unwrap_err();
    assert!(matches!(err, IdlError::Validation { ref path, .. } if path == "P"), "{:?}", err);
}

#[test]
fn test_unknown_struct() {
    let doc = schema(POINT);
    assert!(matches!(encode(&doc, "Nope", &Value::object()), Err(IdlError::UnknownStruct(ref n)) if n == "Nope"));
    assert!(matches!(decode(&doc, "Nope", &[], 0), Err(IdlError::UnknownStruct(_))));
}

#[test]
fn test_unknown_type_only_fails_when_used() {
    let doc = schema("struct S { uint8 a; Missing m; }");

    assert_eq!(encode(&doc, "S", &json(r#"{"a": 1}"#)).unwrap(), [1]);
    assert!(matches!(
        encode(&doc, "S", &json(r#"{"a": 1, "m": 2}"#)),
        Err(IdlError::UnknownType { ref name, .. }) if name == "Missing"
    ));
    assert!(matches!(decode(&doc, "S", &[1, 2], 0), Err(IdlError::UnknownType { .. })));
}

#[test]
fn test_length_prefix_past_end_is_truncated_input() {
    let doc = schema(POINT);
    let err = decode(&doc, "P", &[0x03, 0x01, 0x05, 0x68], 0).unwrap_err();
    match err {
        IdlError::TruncatedInput { path, needed, remaining } => {
            assert_eq!(path, "P.name");
            assert_eq!(needed, 5);
            assert_eq!(remaining, 1);
        }
        other => panic!("expected a TruncatedInput error but got {:?}", other),
    }

    let doc = schema(USERS);
    assert!(matches!(
        decode(&doc, "User", &[1, 200, 1], 0),
        Err(IdlError::TruncatedInput { ref path, .. }) if path == "User.address"
    ));
}

#[test]
fn test_partial_fixed_width_is_truncated_input() {
    let doc = schema("struct W { uint32 n; }");
    assert!(matches!(
        decode(&doc, "W", &[1, 2], 0),
        Err(IdlError::TruncatedInput { needed: 4, remaining: 2, .. })
    ));
}

#[test]
fn test_bad_bool_byte_is_malformed() {
    let doc = schema(POINT);
    assert!(matches!(
        decode(&doc, "P", &[0x03, 0x02], 0),
        Err(IdlError::Malformed { ref path, .. }) if path == "P.ok"
    ));
}

#[test]
fn test_integer_widths() {
    let doc = schema("struct U { uint32 n; int16 m; int e; uint8 b; }");
    let value = json(r#"{"n": 4294967295, "m": -2, "e": -2147483648, "b": 255}"#);

    let bytes = encode(&doc, "U", &value).unwrap();
    assert_eq!(bytes, [0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0x00, 0x00, 0x00, 0x80, 0xFF]);
    assert_eq!(decode(&doc, "U", &bytes, 0).unwrap().0, value);

    // Integral floats are integers
    assert_eq!(encode(&doc, "U", &json(r#"{"n": 3.0}"#)).unwrap(), [3, 0, 0, 0]);
    assert!(encode(&doc, "U", &json(r#"{"n": 3.5}"#)).is_err());
}

#[test]
fn test_floats() {
    let doc = schema("struct F { float32 a; float64 b; float c; }");
    let value = obj(vec![("a", Value::Float(1.5)), ("b", Value::Float(0.1)), ("c", Value::Int(-2))]);

    let bytes = encode(&doc, "F", &value).unwrap();
    let mut expected = vec![0x00, 0x00, 0xC0, 0x3F];
    expected.extend_from_slice(&0.1f64.to_le_bytes());
    expected.extend_from_slice(&(-2.0f64).to_le_bytes());
    assert_eq!(bytes, expected);

    let (decoded, _) = decode(&doc, "F", &bytes, 0).unwrap();
    assert_eq!(decoded, value);

    // Single precision keeps the nearest f32
    let bytes = encode(&doc, "F", &obj(vec![("a", Value::Float(0.1))])).unwrap();
    assert_eq!(decode(&doc, "F", &bytes, 0).unwrap().0.get("a"), Some(&Value::Float(0.1f32 as f64)));
}

#[test]
fn test_any_travels_as_json() {
    let doc = schema("struct E { any extra; uint8 after; }");
    let value = json(r#"{"extra": {"k": [1, 2]}, "after": 9}"#);

    let bytes = encode(&doc, "E", &value).unwrap();
    let text = br#"{"k":[1,2]}"#;
    assert_eq!(bytes[0] as usize, text.len());
    assert_eq!(&bytes[1..1 + text.len()], text);
    assert_eq!(bytes[1 + text.len()], 9);

    assert_eq!(decode(&doc, "E", &bytes, 0).unwrap().0, value);

    let null = obj(vec![("extra", Value::Null)]);
    assert_eq!(encode(&doc, "E", &null).unwrap(), [4, b'n', b'u', b'l', b'l']);
    assert_eq!(decode(&doc, "E", &[4, b'n', b'u', b'l', b'l'], 0).unwrap().0, null);

    assert!(matches!(
        decode(&doc, "E", &[2, b'{', b'x'], 0),
        Err(IdlError::Malformed { .. })
    ));
}

#[test]
fn test_defaults_fill_absent_fields() {
    let doc = schema(
        r#"
        enum Color { RED = 1; }
        struct D { uint8 level : 3; string tag : "none"; Color c : RED; bool flag; }
        "#,
    );

    let bytes = encode(&doc, "D", &Value::object()).unwrap();
    assert_eq!(bytes, [3, 4, b'n', b'o', b'n', b'e', 1]);
    assert_eq!(
        decode(&doc, "D", &bytes, 0).unwrap().0,
        json(r#"{"level": 3, "tag": "none", "c": "RED"}"#)
    );

    // Supplied values win over defaults
    assert_eq!(encode(&doc, "D", &json(r#"{"level": 1, "tag": "", "c": 1}"#)).unwrap(), [1, 0, 1]);
}

#[test]
fn test_string_defaults_keep_their_text() {
    let doc = schema(r#"struct V { string version : 1.0; string flag : true; string name : "x y"; }"#);

    let bytes = encode(&doc, "V", &Value::object()).unwrap();
    assert_eq!(
        bytes,
        [3, b'1', b'.', b'0', 4, b't', b'r', b'u', b'e', 3, b'x', b' ', b'y']
    );
    assert_eq!(
        decode(&doc, "V", &bytes, 0).unwrap().0,
        json(r#"{"version": "1.0", "flag": "true", "name": "x y"}"#)
    );
}

#[test]
fn test_invalid_default_is_a_validation_error() {
    let doc = schema("struct D { uint8 level : 300; }");
    assert!(matches!(
        encode(&doc, "D", &Value::object()),
        Err(IdlError::Validation { ref path, .. }) if path == "D.level"
    ));
}

#[test]
fn test_local_enum_scope_on_encode() {
    let doc = schema(
        r#"
        enum Mode { OFF; ON; }
        struct Device {
            enum Mode { IDLE = 3; BUSY; }
            Mode mode;
            Switch power;
        }
        struct Switch { Mode mode; }
        "#,
    );

    assert_eq!(encode(&doc, "Device", &json(r#"{"mode": "BUSY"}"#)).unwrap(), [4]);
    assert!(encode(&doc, "Device", &json(r#"{"mode": "ON"}"#)).is_err());

    // The nested struct sees the global enum, not its parent's
    let bytes = encode(&doc, "Device", &json(r#"{"mode": "IDLE", "power": {"mode": "ON"}}"#)).unwrap();
    assert_eq!(bytes, [3, 1, 1]);
    assert_eq!(
        decode(&doc, "Device", &bytes, 0).unwrap().0,
        json(r#"{"mode": "IDLE", "power": {"mode": "ON"}}"#)
    );
}

#[test]
fn test_negative_enum_codes() {
    let doc = schema("enum Delta { DOWN = -1; FLAT; UP; } struct T { Delta d; }");

    let bytes = encode(&doc, "T", &json(r#"{"d": "DOWN"}"#)).unwrap();
    assert_eq!(bytes, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
    assert_eq!(decode(&doc, "T", &bytes, 0).unwrap().0, json(r#"{"d": "DOWN"}"#));
    assert_eq!(encode(&doc, "T", &json(r#"{"d": "UP"}"#)).unwrap(), [1]);
}

#[test]
fn test_duplicate_enum_values_decode_to_last_name() {
    let doc = schema("enum E { A = 1; B = 1; } struct S { E e; }");
    assert_eq!(encode(&doc, "S", &json(r#"{"e": "A"}"#)).unwrap(), [1]);
    assert_eq!(decode(&doc, "S", &[1], 0).unwrap().0, json(r#"{"e": "B"}"#));
}

fn chain(depth: usize) -> Value {
    let mut value = obj(vec![("v", Value::Int(0))]);
    for i in 1..=depth {
        value = obj(vec![("v", Value::Int(i as i64)), ("next", value)]);
    }
    value
}

#[test]
fn test_recursive_struct_round_trip() {
    let doc = schema("struct Node { uint8 v; Node next; }");
    let value = chain(5);
    let bytes = encode(&doc, "Node", &value).unwrap();
    assert_eq!(decode(&doc, "Node", &bytes, 0).unwrap(), (value, bytes.len()));
}

#[test]
fn test_depth_limit() {
    let doc = schema("struct Node { uint8 v; Node next; }");
    let limited = Codec::new(&doc).with_limits(CodecLimits { max_depth: 3, ..CodecLimits::default() });
    assert_eq!(limited.limits().max_depth, 3);
    assert_eq!(limited.limits().max_length, CodecLimits::default().max_length);
    assert!(std::ptr::eq(limited.schema(), &doc));

    assert!(limited.encode("Node", &chain(3)).is_ok());
    assert!(matches!(
        limited.encode("Node", &chain(4)),
        Err(IdlError::DepthLimitExceeded { limit: 3, .. })
    ));

    let bytes = encode(&doc, "Node", &chain(4)).unwrap();
    assert!(matches!(
        limited.decode("Node", &bytes, 0),
        Err(IdlError::DepthLimitExceeded { .. })
    ));
}

#[test]
fn test_oversized_length_prefix() {
    let doc = schema("struct S { string s; }");
    // Declares u64::MAX bytes
    let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
    assert!(matches!(decode(&doc, "S", &bytes, 0), Err(IdlError::LengthLimitExceeded { .. })));

    // Overlong varint
    let bytes = [0x80; 12];
    assert!(matches!(decode(&doc, "S", &bytes, 0), Err(IdlError::Malformed { .. })));
}

#[test]
fn test_varint_overflow_at_end_of_input_is_malformed() {
    let doc = schema("struct S { string s; }");

    let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];
    assert!(
        matches!(decode(&doc, "S", &bytes, 0), Err(IdlError::Malformed { ref path, .. }) if path == "S.s")
    );

    let bytes = [0x80; 10];
    assert!(matches!(decode(&doc, "S", &bytes, 0), Err(IdlError::Malformed { .. })));

    // Still truncated when the varint itself is cut short
    let bytes = [0xFF, 0xFF, 0xFF];
    assert!(matches!(decode(&doc, "S", &bytes, 0), Err(IdlError::TruncatedInput { .. })));
}

#[test]
fn test_omitted_middle_field_shifts_later_fields() {
    let doc = schema(POINT);

    let bytes = encode(&doc, "P", &json(r#"{"ok": true, "name": "hi"}"#)).unwrap();
    assert_eq!(bytes, [1, 2, b'h', b'i']);

    // The `ok` byte lands in `x` and the string length lands in `ok`
    match decode(&doc, "P", &bytes, 0) {
        Err(IdlError::Malformed { path, .. }) => assert_eq!(path, "P.ok"),
        other => panic!("expected a Malformed error but got {:?}", other),
    }
}

#[test]
fn test_deep_nesting_with_long_payloads() {
    let doc = schema("struct Node { string label; Node next; }");
    let label = "x".repeat(200);

    let mut value = obj(vec![("label", Value::from(label.as_str()))]);
    for _ in 0..3 {
        value = obj(vec![("label", Value::from(label.as_str())), ("next", value)]);
    }

    let bytes = encode(&doc, "Node", &value).unwrap();
    // Innermost: 2-byte length + 200; each outer level adds a label and a prefix
    let innermost = 202;
    let level2 = 202 + 2 + innermost;
    let level3 = 202 + 2 + level2;
    let top = 202 + 2 + level3;
    assert_eq!(bytes.len(), top);
    assert_eq!(&bytes[202..204], [0xE2, 0x04]);

    assert_eq!(decode(&doc, "Node", &bytes, 0).unwrap(), (value, top));
}

#[test]
fn test_schema_is_untouched_by_failures() {
    let doc = schema(USERS);
    let before = doc.clone();
    let _ = encode(&doc, "User", &json(r#"{"id": 999}"#));
    let _ = decode(&doc, "User", &[1, 50], 0);
    assert_eq!(doc, before);
}
