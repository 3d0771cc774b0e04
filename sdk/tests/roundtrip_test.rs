use brine_idl::{compile_schema, decode, encode, SchemaDocument, Value};
use proptest::prelude::*;

const SCHEMA: &str = r#"
    enum Color { RED = 1; GREEN = 2; BLUE = 3; }

    struct Inner {
        string label;
        float32 ratio;
    }

    struct Outer {
        int8[-5,5] x;
        uint16 port;
        int32 delta;
        bool ok;
        string name;
        Color color;
        float64 weight;
        Inner inner;
        any extra;
    }
"#;

fn schema() -> SchemaDocument {
    compile_schema(SCHEMA).unwrap()
}

prop_compose! {
    fn inner_value()(label in "\\PC*", ratio in -1.0e6f32..1.0e6f32) -> Value {
        vec![("label", Value::from(label)), ("ratio", Value::Float(ratio as f64))]
            .into_iter()
            .collect()
    }
}

prop_compose! {
    fn outer_value()(
        x in -5i64..=5,
        port in 0i64..=65535,
        delta in any::<i32>(),
        ok in any::<bool>(),
        name in "\\PC*",
        color in prop::sample::select(vec!["RED", "GREEN", "BLUE"]),
        weight in -1.0e12f64..1.0e12f64,
        inner in inner_value(),
        extra in prop::collection::vec(any::<i32>(), 0..4),
    ) -> Value {
        let extra = Value::Array(extra.into_iter().map(Value::from).collect());
        vec![
            ("x", Value::Int(x)),
            ("port", Value::Int(port)),
            ("delta", Value::from(delta)),
            ("ok", Value::Bool(ok)),
            ("name", Value::from(name)),
            ("color", Value::from(color)),
            ("weight", Value::Float(weight)),
            ("inner", inner),
            ("extra", extra),
        ]
        .into_iter()
        .collect()
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in outer_value()) {
        let doc = schema();
        let bytes = encode(&doc, "Outer", &value).unwrap();
        let (decoded, end) = decode(&doc, "Outer", &bytes, 0).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(end, bytes.len());
    }

    #[test]
    fn trailing_bytes_do_not_change_the_result(
        value in outer_value(),
        trailing in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let doc = schema();
        let bytes = encode(&doc, "Outer", &value).unwrap();
        let len = bytes.len();

        let mut framed = bytes;
        framed.extend(trailing);
        let (decoded, end) = decode(&doc, "Outer", &framed, 0).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(end, len);
    }

    #[test]
    fn out_of_range_x_is_rejected(x in prop_oneof![i8::MIN as i64..-5, 6i64..=i8::MAX as i64]) {
        let doc = schema();
        let value: Value = vec![("x", Value::Int(x))].into_iter().collect();
        prop_assert!(encode(&doc, "Outer", &value).is_err());
    }

    #[test]
    fn decoding_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let doc = schema();
        if let Ok((_, end)) = decode(&doc, "Outer", &bytes, 0) {
            prop_assert!(end <= bytes.len());
        }
    }
}
