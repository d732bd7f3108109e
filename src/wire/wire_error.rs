use crate::codec::CodecError;
use std::fmt;

/// Frame or envelope bytes that do not parse.
///
/// A malformed response frame fails the entire outstanding batch, so this
/// error is `Clone` and fans out to every pending call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedFrameError {
    Codec(CodecError),

    /// A frame length prefix exceeded the payload bound.
    PayloadTooLarge(u64),

    /// A catalog descriptor used a code outside the known ranges.
    UnknownTypeCode(u64),

    /// An enumeration ordinal did not fit its 32-bit wire range.
    OrdinalOutOfRange(i64),

    /// A descriptor nested past the parse bound.
    DescriptorTooDeep,

    /// A result or handshake flag byte held unknown bits.
    UnknownFlags(u8),

    /// The response carried a different number of results than the request
    /// carried calls.
    ResultCountMismatch { expected: usize, got: usize },

    /// A handshake began with the wrong magic bytes.
    BadMagic,
}

impl fmt::Display for MalformedFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedFrameError::Codec(e) => write!(f, "{}", e),
            MalformedFrameError::PayloadTooLarge(len) => {
                write!(f, "frame payload length {} exceeds bound", len)
            }
            MalformedFrameError::UnknownTypeCode(code) => {
                write!(f, "unknown type code {}", code)
            }
            MalformedFrameError::OrdinalOutOfRange(ordinal) => {
                write!(f, "enumeration ordinal {} out of 32-bit range", ordinal)
            }
            MalformedFrameError::DescriptorTooDeep => {
                write!(f, "type descriptor nests past the parse bound")
            }
            MalformedFrameError::UnknownFlags(flags) => {
                write!(f, "unknown flag bits 0b{:08b}", flags)
            }
            MalformedFrameError::ResultCountMismatch { expected, got } => write!(
                f,
                "response carries {} result(s) for {} pending call(s)",
                got, expected
            ),
            MalformedFrameError::BadMagic => write!(f, "handshake magic mismatch"),
        }
    }
}

impl std::error::Error for MalformedFrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MalformedFrameError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for MalformedFrameError {
    fn from(e: CodecError) -> Self {
        MalformedFrameError::Codec(e)
    }
}
