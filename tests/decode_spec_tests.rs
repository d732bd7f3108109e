use wirecall::codec::{ByteWriter, CodecError};
use wirecall::schema::{
    CollectionKind, DecodeMismatchError, DecodeSpec, EncodeMismatchError, EnumTable, ObjectHandle,
    ScalarKind, SpecBuildError, TypeDescriptor, Value, encode_value,
};

fn round_trip(value: &Value, descriptor: &TypeDescriptor) -> Value {
    let bytes = encode_value(value, descriptor).expect("encode");
    let spec = DecodeSpec::build(descriptor).expect("build");
    spec.decode(&bytes).expect("decode")
}

#[test]
fn scalars_round_trip_through_their_descriptors() {
    let cases = [
        (Value::Double(6.674e-11), TypeDescriptor::scalar(ScalarKind::Double)),
        (Value::Float(-1.25), TypeDescriptor::scalar(ScalarKind::Float)),
        (Value::SInt32(-40_000), TypeDescriptor::scalar(ScalarKind::SInt32)),
        (Value::SInt64(i64::MIN), TypeDescriptor::scalar(ScalarKind::SInt64)),
        (Value::UInt32(u32::MAX), TypeDescriptor::scalar(ScalarKind::UInt32)),
        (Value::UInt64(u64::MAX), TypeDescriptor::scalar(ScalarKind::UInt64)),
        (Value::Bool(true), TypeDescriptor::scalar(ScalarKind::Bool)),
        (
            Value::String("periapsis".to_string()),
            TypeDescriptor::scalar(ScalarKind::String),
        ),
        (
            Value::Bytes(vec![9, 8, 7]),
            TypeDescriptor::scalar(ScalarKind::Bytes),
        ),
    ];

    for (value, descriptor) in cases {
        assert_eq!(round_trip(&value, &descriptor), value);
    }
}

#[test]
fn value_of_the_wrong_kind_fails_before_encode() {
    let err = encode_value(
        &Value::String("not a number".to_string()),
        &TypeDescriptor::scalar(ScalarKind::UInt32),
    )
    .unwrap_err();
    assert!(matches!(err, EncodeMismatchError::Shape { .. }));
}

fn status_table() -> EnumTable {
    EnumTable::new(vec![
        (0, "idle".to_string()),
        (1, "active".to_string()),
        (-1, "unknown".to_string()),
    ])
}

#[test]
fn every_listed_enum_name_round_trips() {
    let descriptor = TypeDescriptor::enumeration("probe", "Status", status_table());
    for name in ["idle", "active", "unknown"] {
        let value = Value::Enum(name.to_string());
        assert_eq!(round_trip(&value, &descriptor), value);
    }
}

#[test]
fn unlisted_enum_name_fails_to_encode() {
    let descriptor = TypeDescriptor::enumeration("probe", "Status", status_table());
    let err = encode_value(&Value::Enum("bogus".to_string()), &descriptor).unwrap_err();
    assert_eq!(err, EncodeMismatchError::UnknownEnumName("bogus".to_string()));
}

#[test]
fn unlisted_enum_ordinal_fails_to_decode() {
    let descriptor = TypeDescriptor::enumeration("probe", "Status", status_table());
    let spec = DecodeSpec::build(&descriptor).unwrap();

    let mut w = ByteWriter::new();
    w.put_svarint(17);
    assert_eq!(
        spec.decode(w.as_slice()),
        Err(DecodeMismatchError::UnknownEnumOrdinal(17))
    );
}

#[test]
fn class_values_decode_to_opaque_handles() {
    let descriptor = TypeDescriptor::class("orbit", "Vessel");
    let value = Value::Class(ObjectHandle(0xdead_beef_cafe));
    assert_eq!(round_trip(&value, &descriptor), value);
}

#[test]
fn list_of_tuples_round_trips_in_order() {
    let descriptor = TypeDescriptor::list(TypeDescriptor::tuple(vec![
        TypeDescriptor::scalar(ScalarKind::UInt32),
        TypeDescriptor::scalar(ScalarKind::String),
    ]));
    let value = Value::List(vec![
        Value::Tuple(vec![Value::UInt32(1), Value::String("one".to_string())]),
        Value::Tuple(vec![Value::UInt32(2), Value::String("two".to_string())]),
        Value::Tuple(vec![Value::UInt32(3), Value::String("three".to_string())]),
    ]);
    assert_eq!(round_trip(&value, &descriptor), value);
}

#[test]
fn sets_and_dictionaries_round_trip_preserving_order() {
    let set_descriptor = TypeDescriptor::set(TypeDescriptor::scalar(ScalarKind::UInt32));
    let set_value = Value::Set(vec![Value::UInt32(3), Value::UInt32(1), Value::UInt32(2)]);
    assert_eq!(round_trip(&set_value, &set_descriptor), set_value);

    let dict_descriptor = TypeDescriptor::dictionary(TypeDescriptor::scalar(ScalarKind::SInt64));
    let dict_value = Value::Dictionary(vec![
        ("apoapsis".to_string(), Value::SInt64(120_000)),
        ("periapsis".to_string(), Value::SInt64(-250)),
    ]);
    assert_eq!(round_trip(&dict_value, &dict_descriptor), dict_value);
}

#[test]
fn tuple_arity_is_checked_on_both_paths() {
    let descriptor = TypeDescriptor::tuple(vec![
        TypeDescriptor::scalar(ScalarKind::UInt32),
        TypeDescriptor::scalar(ScalarKind::UInt32),
    ]);

    let err = encode_value(&Value::Tuple(vec![Value::UInt32(1)]), &descriptor).unwrap_err();
    assert_eq!(err, EncodeMismatchError::TupleArity { expected: 2, got: 1 });

    // Wire claims one element for a two-element tuple spec.
    let spec = DecodeSpec::build(&descriptor).unwrap();
    let mut w = ByteWriter::new();
    w.put_uvarint(1);
    w.put_uvarint(5);
    assert_eq!(
        spec.decode(w.as_slice()),
        Err(DecodeMismatchError::TupleArity { expected: 2, got: 1 })
    );
}

#[test]
fn nesting_deeper_than_the_bound_is_rejected() {
    let mut descriptor = TypeDescriptor::scalar(ScalarKind::UInt32);
    for _ in 0..8 {
        descriptor = TypeDescriptor::list(descriptor);
    }
    let err = DecodeSpec::build(&descriptor).unwrap_err();
    assert!(matches!(err, SpecBuildError::DepthLimitExceeded { .. }));
}

#[test]
fn malformed_dictionary_descriptors_are_rejected() {
    let missing_value = TypeDescriptor::Collection {
        kind: CollectionKind::Dictionary,
        children: vec![TypeDescriptor::scalar(ScalarKind::String)],
    };
    assert_eq!(
        DecodeSpec::build(&missing_value).unwrap_err(),
        SpecBuildError::DictionaryArity { children: 1 }
    );

    let integer_key = TypeDescriptor::Collection {
        kind: CollectionKind::Dictionary,
        children: vec![
            TypeDescriptor::scalar(ScalarKind::UInt32),
            TypeDescriptor::scalar(ScalarKind::UInt32),
        ],
    };
    assert_eq!(
        DecodeSpec::build(&integer_key).unwrap_err(),
        SpecBuildError::DictionaryKeyNotString
    );
}

#[test]
fn none_spec_decodes_an_absent_value() {
    let spec = DecodeSpec::build(&TypeDescriptor::scalar(ScalarKind::None)).unwrap();
    assert_eq!(spec.decode(&[]), Ok(Value::None));
}

#[test]
fn trailing_bytes_after_a_complete_value_are_a_mismatch() {
    let spec = DecodeSpec::build(&TypeDescriptor::scalar(ScalarKind::UInt32)).unwrap();
    let mut w = ByteWriter::new();
    w.put_uvarint(9);
    w.put_u8(0);
    assert_eq!(
        spec.decode(w.as_slice()),
        Err(DecodeMismatchError::Codec(CodecError::TrailingBytes(1)))
    );
}
