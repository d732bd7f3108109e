use crate::codec::ByteReader;
use crate::constants::MAX_TYPE_DEPTH;
use crate::schema::{
    CollectionKind, DecodeMismatchError, EnumTable, MessageKind, ObjectHandle, ScalarKind,
    SpecBuildError, TypeDescriptor, Value,
};

/// Compiled mirror of a [`TypeDescriptor`], ready to interpret result bytes.
///
/// A spec is built once per procedure (by the binding generator) and then
/// cloned per invocation. Decoding dispatches on the variant with a single
/// exhaustive match; there is no runtime probing of the shape.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeSpec {
    Scalar(ScalarKind),
    Enum(EnumTable),
    /// Decodes to an opaque unsigned 64-bit handle.
    Object,
    /// Passes the raw result bytes through unchanged. Used for envelope
    /// message payloads the caller parses itself (e.g. the catalog blob).
    Opaque,
    Collection {
        kind: CollectionKind,
        children: Vec<DecodeSpec>,
    },
}

impl DecodeSpec {
    /// Compiles a descriptor, rejecting malformed shapes and nesting deeper
    /// than `MAX_TYPE_DEPTH`.
    pub fn build(descriptor: &TypeDescriptor) -> Result<DecodeSpec, SpecBuildError> {
        Self::build_at_depth(descriptor, 0)
    }

    fn build_at_depth(descriptor: &TypeDescriptor, depth: usize) -> Result<DecodeSpec, SpecBuildError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(SpecBuildError::DepthLimitExceeded {
                depth,
                max: MAX_TYPE_DEPTH,
            });
        }

        match descriptor {
            TypeDescriptor::Scalar(kind) => Ok(DecodeSpec::Scalar(*kind)),
            TypeDescriptor::Enumeration { values, .. } => Ok(DecodeSpec::Enum(values.clone())),
            TypeDescriptor::Class { .. } => Ok(DecodeSpec::Object),
            // Stream and event messages carry a stream identifier; the
            // remaining envelope kinds are handed to the caller raw.
            TypeDescriptor::Message(MessageKind::Stream | MessageKind::Event) => {
                Ok(DecodeSpec::Scalar(ScalarKind::UInt64))
            }
            TypeDescriptor::Message(_) => Ok(DecodeSpec::Opaque),
            TypeDescriptor::Collection { kind, children } => {
                match kind {
                    CollectionKind::Tuple => {}
                    CollectionKind::List | CollectionKind::Set => {
                        if children.len() != 1 {
                            return Err(SpecBuildError::CollectionArity {
                                kind: *kind,
                                children: children.len(),
                            });
                        }
                    }
                    CollectionKind::Dictionary => {
                        if children.len() != 2 {
                            return Err(SpecBuildError::DictionaryArity {
                                children: children.len(),
                            });
                        }
                        if children[0] != TypeDescriptor::Scalar(ScalarKind::String) {
                            return Err(SpecBuildError::DictionaryKeyNotString);
                        }
                    }
                }
                let children = children
                    .iter()
                    .map(|child| Self::build_at_depth(child, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DecodeSpec::Collection {
                    kind: *kind,
                    children,
                })
            }
        }
    }

    /// Decodes one complete result payload. Trailing bytes are a mismatch.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeMismatchError> {
        let mut r = ByteReader::new(bytes);
        let value = self.decode_from(&mut r)?;
        r.expect_end()?;
        Ok(value)
    }

    fn decode_from(&self, r: &mut ByteReader) -> Result<Value, DecodeMismatchError> {
        match self {
            DecodeSpec::Scalar(kind) => decode_scalar(*kind, r),
            DecodeSpec::Enum(table) => {
                let ordinal = r.read_svarint()?;
                let name = i32::try_from(ordinal)
                    .ok()
                    .and_then(|ordinal| table.name_of(ordinal))
                    .ok_or(DecodeMismatchError::UnknownEnumOrdinal(ordinal))?;
                Ok(Value::Enum(name.to_string()))
            }
            DecodeSpec::Object => Ok(Value::Class(ObjectHandle(r.read_uvarint()?))),
            DecodeSpec::Opaque => {
                let rest = r.read_exact(r.remaining())?;
                Ok(Value::Bytes(rest.to_vec()))
            }
            DecodeSpec::Collection { kind, children } => match kind {
                CollectionKind::Tuple => {
                    let count = r.read_len_prefix()?;
                    if count != children.len() {
                        return Err(DecodeMismatchError::TupleArity {
                            expected: children.len(),
                            got: count,
                        });
                    }
                    let mut elements = Vec::with_capacity(count);
                    for child in children {
                        elements.push(child.decode_from(r)?);
                    }
                    Ok(Value::Tuple(elements))
                }
                CollectionKind::List | CollectionKind::Set => {
                    // Arity was validated at build time.
                    let element_spec = &children[0];
                    let count = r.read_len_prefix()?;
                    let mut elements = Vec::with_capacity(count.min(1024));
                    for _ in 0..count {
                        elements.push(element_spec.decode_from(r)?);
                    }
                    Ok(match kind {
                        CollectionKind::Set => Value::Set(elements),
                        _ => Value::List(elements),
                    })
                }
                CollectionKind::Dictionary => {
                    let value_spec = &children[1];
                    let count = r.read_len_prefix()?;
                    let mut entries = Vec::with_capacity(count.min(1024));
                    for _ in 0..count {
                        let key = r.read_string()?;
                        entries.push((key, value_spec.decode_from(r)?));
                    }
                    Ok(Value::Dictionary(entries))
                }
            },
        }
    }
}

fn decode_scalar(kind: ScalarKind, r: &mut ByteReader) -> Result<Value, DecodeMismatchError> {
    let value = match kind {
        ScalarKind::None => Value::None,
        ScalarKind::Double => Value::Double(r.read_f64()?),
        ScalarKind::Float => Value::Float(r.read_f32()?),
        ScalarKind::SInt32 => {
            let wide = r.read_svarint()?;
            let narrow = i32::try_from(wide)
                .map_err(|_| DecodeMismatchError::Codec(crate::codec::CodecError::VarintOverflow))?;
            Value::SInt32(narrow)
        }
        ScalarKind::SInt64 => Value::SInt64(r.read_svarint()?),
        ScalarKind::UInt32 => {
            let wide = r.read_uvarint()?;
            let narrow = u32::try_from(wide)
                .map_err(|_| DecodeMismatchError::Codec(crate::codec::CodecError::VarintOverflow))?;
            Value::UInt32(narrow)
        }
        ScalarKind::UInt64 => Value::UInt64(r.read_uvarint()?),
        ScalarKind::Bool => Value::Bool(r.read_bool()?),
        ScalarKind::String => Value::String(r.read_string()?),
        ScalarKind::Bytes => Value::Bytes(r.read_bytes()?),
    };
    Ok(value)
}
