use crate::codec::ByteWriter;
use crate::constants::MAX_TYPE_DEPTH;
use crate::schema::{CollectionKind, EncodeMismatchError, ScalarKind, SpecBuildError, TypeDescriptor};
use std::fmt;

/// Opaque reference to server-owned object state.
///
/// The identifier is never dereferenced client-side; it only travels back to
/// the server as an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decoded wire value, or a value about to be encoded as an argument.
///
/// Sets are kept as order-preserving vectors (floats and composites are not
/// hashable client-side); dictionary keys are always strings on this wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Double(f64),
    Float(f32),
    SInt32(i32),
    SInt64(i64),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Enum(String),
    Class(ObjectHandle),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Dictionary(Vec<(String, Value)>),
}

impl Value {
    /// Variant name used in mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Double(_) => "double",
            Value::Float(_) => "float",
            Value::SInt32(_) => "sInt32",
            Value::SInt64(_) => "sInt64",
            Value::UInt32(_) => "uInt32",
            Value::UInt64(_) => "uInt64",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Class(_) => "class",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Encodes a value against its declared descriptor.
///
/// Any shape disagreement fails here, before the bytes ever reach a request.
pub fn encode_value(value: &Value, descriptor: &TypeDescriptor) -> Result<Vec<u8>, EncodeMismatchError> {
    let mut w = ByteWriter::new();
    encode_into(value, descriptor, &mut w, 0)?;
    Ok(w.into_bytes())
}

fn shape_error(descriptor: &TypeDescriptor, value: &Value) -> EncodeMismatchError {
    let expected = match descriptor {
        TypeDescriptor::Scalar(kind) => kind.label().to_string(),
        TypeDescriptor::Enumeration { service, name, .. } => format!("{}.{}", service, name),
        TypeDescriptor::Class { service, name } => format!("{}.{}", service, name),
        TypeDescriptor::Message(kind) => format!("{:?}", kind),
        TypeDescriptor::Collection { kind, .. } => kind.label().to_string(),
    };
    EncodeMismatchError::Shape {
        expected,
        got: value.kind_name(),
    }
}

fn encode_into(
    value: &Value,
    descriptor: &TypeDescriptor,
    w: &mut ByteWriter,
    depth: usize,
) -> Result<(), EncodeMismatchError> {
    if depth > MAX_TYPE_DEPTH {
        return Err(SpecBuildError::DepthLimitExceeded {
            depth,
            max: MAX_TYPE_DEPTH,
        }
        .into());
    }

    match (descriptor, value) {
        (TypeDescriptor::Scalar(ScalarKind::None), Value::None) => Ok(()),
        (TypeDescriptor::Scalar(ScalarKind::Double), Value::Double(v)) => {
            w.put_f64(*v);
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::Float), Value::Float(v)) => {
            w.put_f32(*v);
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::SInt32), Value::SInt32(v)) => {
            w.put_svarint(i64::from(*v));
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::SInt64), Value::SInt64(v)) => {
            w.put_svarint(*v);
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::UInt32), Value::UInt32(v)) => {
            w.put_uvarint(u64::from(*v));
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::UInt64), Value::UInt64(v)) => {
            w.put_uvarint(*v);
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::Bool), Value::Bool(v)) => {
            w.put_bool(*v);
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::String), Value::String(v)) => {
            w.put_string(v);
            Ok(())
        }
        (TypeDescriptor::Scalar(ScalarKind::Bytes), Value::Bytes(v)) => {
            w.put_bytes(v);
            Ok(())
        }
        (TypeDescriptor::Enumeration { values, .. }, Value::Enum(name)) => {
            let ordinal = values
                .ordinal_of(name)
                .ok_or_else(|| EncodeMismatchError::UnknownEnumName(name.clone()))?;
            w.put_svarint(i64::from(ordinal));
            Ok(())
        }
        (TypeDescriptor::Class { .. }, Value::Class(handle)) => {
            w.put_uvarint(handle.0);
            Ok(())
        }
        (
            TypeDescriptor::Collection {
                kind: CollectionKind::Tuple,
                children,
            },
            Value::Tuple(elements),
        ) => {
            if elements.len() != children.len() {
                return Err(EncodeMismatchError::TupleArity {
                    expected: children.len(),
                    got: elements.len(),
                });
            }
            w.put_uvarint(elements.len() as u64);
            for (element, child) in elements.iter().zip(children) {
                encode_into(element, child, w, depth + 1)?;
            }
            Ok(())
        }
        (
            TypeDescriptor::Collection {
                kind: kind @ CollectionKind::List,
                children,
            },
            Value::List(elements),
        )
        | (
            TypeDescriptor::Collection {
                kind: kind @ CollectionKind::Set,
                children,
            },
            Value::Set(elements),
        ) => {
            let element_descriptor = match children.as_slice() {
                [child] => child,
                _ => {
                    return Err(SpecBuildError::CollectionArity {
                        kind: *kind,
                        children: children.len(),
                    }
                    .into());
                }
            };
            w.put_uvarint(elements.len() as u64);
            for element in elements {
                encode_into(element, element_descriptor, w, depth + 1)?;
            }
            Ok(())
        }
        (
            TypeDescriptor::Collection {
                kind: CollectionKind::Dictionary,
                children,
            },
            Value::Dictionary(entries),
        ) => {
            let value_descriptor = match children.as_slice() {
                [TypeDescriptor::Scalar(ScalarKind::String), value_descriptor] => value_descriptor,
                [_, _] => return Err(SpecBuildError::DictionaryKeyNotString.into()),
                _ => {
                    return Err(SpecBuildError::DictionaryArity {
                        children: children.len(),
                    }
                    .into());
                }
            };
            w.put_uvarint(entries.len() as u64);
            for (key, entry_value) in entries {
                w.put_string(key);
                encode_into(entry_value, value_descriptor, w, depth + 1)?;
            }
            Ok(())
        }
        _ => Err(shape_error(descriptor, value)),
    }
}
