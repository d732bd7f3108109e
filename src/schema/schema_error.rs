use crate::codec::CodecError;
use crate::schema::CollectionKind;
use std::fmt;

/// Rejections raised while compiling a `TypeDescriptor` into a `DecodeSpec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecBuildError {
    /// Nesting exceeded `MAX_TYPE_DEPTH`; the catalog metadata is suspect.
    DepthLimitExceeded { depth: usize, max: usize },

    /// A list or set did not have exactly one child descriptor.
    CollectionArity { kind: CollectionKind, children: usize },

    /// A dictionary did not have exactly two children.
    DictionaryArity { children: usize },

    /// A dictionary's first child was not the string scalar.
    DictionaryKeyNotString,
}

impl fmt::Display for SpecBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecBuildError::DepthLimitExceeded { depth, max } => {
                write!(f, "descriptor nesting depth {} exceeds limit {}", depth, max)
            }
            SpecBuildError::CollectionArity { kind, children } => write!(
                f,
                "{} descriptor must have exactly 1 child, found {}",
                kind.label(),
                children
            ),
            SpecBuildError::DictionaryArity { children } => write!(
                f,
                "dictionary descriptor must have exactly 2 children, found {}",
                children
            ),
            SpecBuildError::DictionaryKeyNotString => {
                write!(f, "dictionary key descriptor must be string")
            }
        }
    }
}

impl std::error::Error for SpecBuildError {}

/// Value-to-descriptor shape failures detected before any network I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeMismatchError {
    /// The value's variant does not match the descriptor's kind.
    Shape { expected: String, got: &'static str },

    /// The name is not listed in the enumeration's table.
    UnknownEnumName(String),

    /// A tuple value had the wrong number of elements for its descriptor.
    TupleArity { expected: usize, got: usize },

    /// The descriptor itself is ill-formed (bad collection shape or depth).
    Descriptor(SpecBuildError),
}

impl fmt::Display for EncodeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeMismatchError::Shape { expected, got } => {
                write!(f, "cannot encode {} value as {}", got, expected)
            }
            EncodeMismatchError::UnknownEnumName(name) => {
                write!(f, "name {:?} is not listed in the enumeration", name)
            }
            EncodeMismatchError::TupleArity { expected, got } => {
                write!(f, "tuple expects {} element(s), value has {}", expected, got)
            }
            EncodeMismatchError::Descriptor(e) => write!(f, "ill-formed descriptor: {}", e),
        }
    }
}

impl std::error::Error for EncodeMismatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeMismatchError::Descriptor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpecBuildError> for EncodeMismatchError {
    fn from(e: SpecBuildError) -> Self {
        EncodeMismatchError::Descriptor(e)
    }
}

/// Received bytes did not match the expected `DecodeSpec` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeMismatchError {
    Codec(CodecError),

    /// The ordinal on the wire is not listed in the enumeration's table.
    UnknownEnumOrdinal(i64),

    /// The element count on the wire disagrees with the tuple descriptor.
    TupleArity { expected: usize, got: usize },
}

impl fmt::Display for DecodeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeMismatchError::Codec(e) => write!(f, "{}", e),
            DecodeMismatchError::UnknownEnumOrdinal(ordinal) => {
                write!(f, "ordinal {} is not listed in the enumeration", ordinal)
            }
            DecodeMismatchError::TupleArity { expected, got } => {
                write!(f, "tuple expects {} element(s), wire has {}", expected, got)
            }
        }
    }
}

impl std::error::Error for DecodeMismatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeMismatchError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for DecodeMismatchError {
    fn from(e: CodecError) -> Self {
        DecodeMismatchError::Codec(e)
    }
}
