use std::fmt;

/// Low-level byte decoding errors.
///
/// These surface through both `MalformedFrameError` (when the bytes belong
/// to a wire envelope) and `DecodeMismatchError` (when they belong to a
/// procedure result). `Clone` is required because a single failure may be
/// fanned out to every call in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before the value was complete.
    UnexpectedEof,

    /// A varint ran past the maximum encodable width for a `u64`.
    VarintOverflow,

    /// A boolean varint held something other than 0 or 1.
    InvalidBool(u64),

    /// A string's bytes were not valid UTF-8.
    InvalidUtf8,

    /// A length prefix exceeded the configured payload bound.
    LengthOverflow(u64),

    /// Bytes remained after a complete top-level value was decoded.
    TrailingBytes(usize),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnexpectedEof => write!(f, "unexpected end of input"),
            CodecError::VarintOverflow => write!(f, "varint exceeds 64 bits"),
            CodecError::InvalidBool(v) => write!(f, "invalid boolean varint: {}", v),
            CodecError::InvalidUtf8 => write!(f, "string bytes are not valid UTF-8"),
            CodecError::LengthOverflow(len) => {
                write!(f, "length prefix {} exceeds payload bound", len)
            }
            CodecError::TrailingBytes(n) => {
                write!(f, "{} trailing byte(s) after complete value", n)
            }
        }
    }
}

impl std::error::Error for CodecError {}
