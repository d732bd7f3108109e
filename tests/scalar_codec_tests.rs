use rand::Rng;
use wirecall::codec::{ByteReader, ByteWriter, CodecError, zigzag_decode, zigzag_encode};

#[test]
fn uvarint_round_trips_boundary_values() {
    let values = [
        0u64,
        1,
        127,
        128,
        16_383,
        16_384,
        u64::from(u32::MAX),
        u64::MAX - 1,
        u64::MAX,
    ];

    for value in values {
        let mut w = ByteWriter::new();
        w.put_uvarint(value);
        let bytes = w.into_bytes();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_uvarint().unwrap(), value);
        r.expect_end().unwrap();
    }
}

#[test]
fn uvarint_round_trips_random_values() {
    let mut rng = rand::rng();
    for _ in 0..1_000 {
        let value: u64 = rng.random();
        let mut w = ByteWriter::new();
        w.put_uvarint(value);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_uvarint().unwrap(), value);
    }
}

#[test]
fn zigzag_is_its_own_inverse() {
    let values = [0i64, -1, 1, -2, 2, i64::MIN, i64::MAX, -123_456_789];
    for value in values {
        assert_eq!(zigzag_decode(zigzag_encode(value)), value);
    }

    // Small magnitudes map to small codes regardless of sign.
    assert_eq!(zigzag_encode(0), 0);
    assert_eq!(zigzag_encode(-1), 1);
    assert_eq!(zigzag_encode(1), 2);
    assert_eq!(zigzag_encode(-2), 3);
}

#[test]
fn svarint_round_trips_random_values() {
    let mut rng = rand::rng();
    for _ in 0..1_000 {
        let value: i64 = rng.random();
        let mut w = ByteWriter::new();
        w.put_svarint(value);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_svarint().unwrap(), value);
    }
}

#[test]
fn floats_round_trip_bit_exact() {
    let doubles = [0.0f64, -0.0, 1.5, -2.25, f64::MAX, f64::MIN_POSITIVE, f64::INFINITY];
    for value in doubles {
        let mut w = ByteWriter::new();
        w.put_f64(value);
        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_f64().unwrap().to_bits(), value.to_bits());
    }

    // NaN payloads survive unchanged.
    let mut w = ByteWriter::new();
    w.put_f64(f64::NAN);
    let mut r = ByteReader::new(w.as_slice());
    assert_eq!(r.read_f64().unwrap().to_bits(), f64::NAN.to_bits());

    let singles = [0.0f32, -0.0, 3.5, f32::NEG_INFINITY];
    for value in singles {
        let mut w = ByteWriter::new();
        w.put_f32(value);
        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_f32().unwrap().to_bits(), value.to_bits());
    }
}

#[test]
fn bool_rejects_non_binary_varints() {
    let mut w = ByteWriter::new();
    w.put_bool(true);
    w.put_bool(false);
    let mut r = ByteReader::new(w.as_slice());
    assert!(r.read_bool().unwrap());
    assert!(!r.read_bool().unwrap());

    let mut r = ByteReader::new(&[2]);
    assert_eq!(r.read_bool(), Err(CodecError::InvalidBool(2)));
}

#[test]
fn strings_and_bytes_round_trip() {
    let mut w = ByteWriter::new();
    w.put_string("hello");
    w.put_string("");
    w.put_string("käse 🚀");
    w.put_bytes(&[0x00, 0xff, 0x7f]);

    let mut r = ByteReader::new(w.as_slice());
    assert_eq!(r.read_string().unwrap(), "hello");
    assert_eq!(r.read_string().unwrap(), "");
    assert_eq!(r.read_string().unwrap(), "käse 🚀");
    assert_eq!(r.read_bytes().unwrap(), vec![0x00, 0xff, 0x7f]);
    r.expect_end().unwrap();
}

#[test]
fn invalid_utf8_is_a_decode_error() {
    let mut w = ByteWriter::new();
    w.put_bytes(&[0xff, 0xfe]);
    let mut r = ByteReader::new(w.as_slice());
    assert_eq!(r.read_string(), Err(CodecError::InvalidUtf8));
}

#[test]
fn truncated_input_is_a_decode_error() {
    // Continuation bit set, nothing follows.
    let mut r = ByteReader::new(&[0x80]);
    assert_eq!(r.read_uvarint(), Err(CodecError::UnexpectedEof));

    // Length prefix promises more than the buffer holds.
    let mut r = ByteReader::new(&[5, b'a', b'b']);
    assert_eq!(r.read_string(), Err(CodecError::UnexpectedEof));

    let mut r = ByteReader::new(&[1, 2, 3]);
    assert_eq!(r.read_f64(), Err(CodecError::UnexpectedEof));
}

#[test]
fn varint_wider_than_u64_is_rejected() {
    let mut r = ByteReader::new(&[0xff; 10]);
    assert_eq!(r.read_uvarint(), Err(CodecError::VarintOverflow));
}

#[test]
fn trailing_bytes_are_reported() {
    let mut w = ByteWriter::new();
    w.put_uvarint(7);
    w.put_u8(0);
    let mut r = ByteReader::new(w.as_slice());
    r.read_uvarint().unwrap();
    assert_eq!(r.expect_end(), Err(CodecError::TrailingBytes(1)));
}
