use crate::codec::{ByteReader, ByteWriter};
use crate::constants::MAX_TYPE_DEPTH;
use crate::wire::MalformedFrameError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Type-kind codes as reported by the service catalog, partitioned by range:
/// 0-9 scalars, 100-101 named types, 200-204 protocol envelope messages,
/// 300-303 collections.
#[repr(u16)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum TypeCode {
    None = 0,
    Double = 1,
    Float = 2,
    SInt32 = 3,
    SInt64 = 4,
    UInt32 = 5,
    UInt64 = 6,
    Bool = 7,
    String = 8,
    Bytes = 9,
    Class = 100,
    Enumeration = 101,
    Event = 200,
    Call = 201,
    Stream = 202,
    Status = 203,
    Services = 204,
    Tuple = 300,
    List = 301,
    Set = 302,
    Dictionary = 303,
}

/// Primitive wire kinds handled by the scalar codec.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScalarKind {
    None,
    Double,
    Float,
    SInt32,
    SInt64,
    UInt32,
    UInt64,
    Bool,
    String,
    Bytes,
}

impl ScalarKind {
    pub fn type_code(self) -> TypeCode {
        match self {
            ScalarKind::None => TypeCode::None,
            ScalarKind::Double => TypeCode::Double,
            ScalarKind::Float => TypeCode::Float,
            ScalarKind::SInt32 => TypeCode::SInt32,
            ScalarKind::SInt64 => TypeCode::SInt64,
            ScalarKind::UInt32 => TypeCode::UInt32,
            ScalarKind::UInt64 => TypeCode::UInt64,
            ScalarKind::Bool => TypeCode::Bool,
            ScalarKind::String => TypeCode::String,
            ScalarKind::Bytes => TypeCode::Bytes,
        }
    }

    pub fn from_type_code(code: TypeCode) -> Option<ScalarKind> {
        match code {
            TypeCode::None => Some(ScalarKind::None),
            TypeCode::Double => Some(ScalarKind::Double),
            TypeCode::Float => Some(ScalarKind::Float),
            TypeCode::SInt32 => Some(ScalarKind::SInt32),
            TypeCode::SInt64 => Some(ScalarKind::SInt64),
            TypeCode::UInt32 => Some(ScalarKind::UInt32),
            TypeCode::UInt64 => Some(ScalarKind::UInt64),
            TypeCode::Bool => Some(ScalarKind::Bool),
            TypeCode::String => Some(ScalarKind::String),
            TypeCode::Bytes => Some(ScalarKind::Bytes),
            _ => None,
        }
    }

    /// Name used in mismatch diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            ScalarKind::None => "none",
            ScalarKind::Double => "double",
            ScalarKind::Float => "float",
            ScalarKind::SInt32 => "sInt32",
            ScalarKind::SInt64 => "sInt64",
            ScalarKind::UInt32 => "uInt32",
            ScalarKind::UInt64 => "uInt64",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
        }
    }
}

/// Protocol envelope message kinds (type codes 200-204).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MessageKind {
    Event,
    Call,
    Stream,
    Status,
    Services,
}

impl MessageKind {
    pub fn type_code(self) -> TypeCode {
        match self {
            MessageKind::Event => TypeCode::Event,
            MessageKind::Call => TypeCode::Call,
            MessageKind::Stream => TypeCode::Stream,
            MessageKind::Status => TypeCode::Status,
            MessageKind::Services => TypeCode::Services,
        }
    }

    pub fn from_type_code(code: TypeCode) -> Option<MessageKind> {
        match code {
            TypeCode::Event => Some(MessageKind::Event),
            TypeCode::Call => Some(MessageKind::Call),
            TypeCode::Stream => Some(MessageKind::Stream),
            TypeCode::Status => Some(MessageKind::Status),
            TypeCode::Services => Some(MessageKind::Services),
            _ => None,
        }
    }
}

/// Container kinds (type codes 300-303).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CollectionKind {
    Tuple,
    List,
    Set,
    Dictionary,
}

impl CollectionKind {
    pub fn type_code(self) -> TypeCode {
        match self {
            CollectionKind::Tuple => TypeCode::Tuple,
            CollectionKind::List => TypeCode::List,
            CollectionKind::Set => TypeCode::Set,
            CollectionKind::Dictionary => TypeCode::Dictionary,
        }
    }

    pub fn from_type_code(code: TypeCode) -> Option<CollectionKind> {
        match code {
            TypeCode::Tuple => Some(CollectionKind::Tuple),
            TypeCode::List => Some(CollectionKind::List),
            TypeCode::Set => Some(CollectionKind::Set),
            TypeCode::Dictionary => Some(CollectionKind::Dictionary),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CollectionKind::Tuple => "tuple",
            CollectionKind::List => "list",
            CollectionKind::Set => "set",
            CollectionKind::Dictionary => "dictionary",
        }
    }
}

/// Ordinal-to-name table for an enumeration type.
///
/// Lookups are resolved in both directions; an unlisted ordinal or name is
/// an error at the call site, never a silent default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumTable {
    entries: Vec<(i32, String)>,
}

impl EnumTable {
    pub fn new(entries: Vec<(i32, String)>) -> Self {
        Self { entries }
    }

    pub fn name_of(&self, ordinal: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(o, _)| *o == ordinal)
            .map(|(_, n)| n.as_str())
    }

    pub fn ordinal_of(&self, name: &str) -> Option<i32> {
        self.entries.iter().find(|(_, n)| n == name).map(|(o, _)| *o)
    }

    pub fn entries(&self) -> &[(i32, String)] {
        &self.entries
    }
}

/// Tagged tree describing an argument or return shape, as reported by the
/// service catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Enumeration {
        service: String,
        name: String,
        values: EnumTable,
    },
    Class {
        service: String,
        name: String,
    },
    Message(MessageKind),
    Collection {
        kind: CollectionKind,
        children: Vec<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn scalar(kind: ScalarKind) -> Self {
        TypeDescriptor::Scalar(kind)
    }

    pub fn class(service: &str, name: &str) -> Self {
        TypeDescriptor::Class {
            service: service.to_string(),
            name: name.to_string(),
        }
    }

    pub fn enumeration(service: &str, name: &str, values: EnumTable) -> Self {
        TypeDescriptor::Enumeration {
            service: service.to_string(),
            name: name.to_string(),
            values,
        }
    }

    pub fn tuple(children: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Collection {
            kind: CollectionKind::Tuple,
            children,
        }
    }

    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::Collection {
            kind: CollectionKind::List,
            children: vec![element],
        }
    }

    pub fn set(element: TypeDescriptor) -> Self {
        TypeDescriptor::Collection {
            kind: CollectionKind::Set,
            children: vec![element],
        }
    }

    /// Dictionary keys are always strings on this wire.
    pub fn dictionary(value: TypeDescriptor) -> Self {
        TypeDescriptor::Collection {
            kind: CollectionKind::Dictionary,
            children: vec![TypeDescriptor::Scalar(ScalarKind::String), value],
        }
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            TypeDescriptor::Scalar(kind) => kind.type_code(),
            TypeDescriptor::Enumeration { .. } => TypeCode::Enumeration,
            TypeDescriptor::Class { .. } => TypeCode::Class,
            TypeDescriptor::Message(kind) => kind.type_code(),
            TypeDescriptor::Collection { kind, .. } => kind.type_code(),
        }
    }

    /// Serializes the descriptor as it appears inside a service catalog.
    pub fn encode(&self, w: &mut ByteWriter) {
        w.put_uvarint(u16::from(self.type_code()) as u64);
        match self {
            TypeDescriptor::Scalar(_) | TypeDescriptor::Message(_) => {}
            TypeDescriptor::Class { service, name } => {
                w.put_string(service);
                w.put_string(name);
            }
            TypeDescriptor::Enumeration {
                service,
                name,
                values,
            } => {
                w.put_string(service);
                w.put_string(name);
                w.put_uvarint(values.entries().len() as u64);
                for (ordinal, value_name) in values.entries() {
                    w.put_svarint(i64::from(*ordinal));
                    w.put_string(value_name);
                }
            }
            TypeDescriptor::Collection { children, .. } => {
                w.put_uvarint(children.len() as u64);
                for child in children {
                    child.encode(w);
                }
            }
        }
    }

    pub fn decode(r: &mut ByteReader) -> Result<Self, MalformedFrameError> {
        Self::decode_at_depth(r, 0)
    }

    fn decode_at_depth(r: &mut ByteReader, depth: usize) -> Result<Self, MalformedFrameError> {
        // Depth is bounded during parsing too, so hostile catalog metadata
        // cannot recurse arbitrarily before `DecodeSpec::build` ever runs.
        if depth > MAX_TYPE_DEPTH {
            return Err(MalformedFrameError::DescriptorTooDeep);
        }

        let raw = r.read_uvarint()?;
        let code = u16::try_from(raw)
            .ok()
            .and_then(|raw| TypeCode::try_from(raw).ok())
            .ok_or(MalformedFrameError::UnknownTypeCode(raw))?;

        if let Some(kind) = ScalarKind::from_type_code(code) {
            return Ok(TypeDescriptor::Scalar(kind));
        }
        if let Some(kind) = MessageKind::from_type_code(code) {
            return Ok(TypeDescriptor::Message(kind));
        }
        if let Some(kind) = CollectionKind::from_type_code(code) {
            let count = r.read_len_prefix()?;
            let mut children = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                children.push(Self::decode_at_depth(r, depth + 1)?);
            }
            return Ok(TypeDescriptor::Collection { kind, children });
        }

        match code {
            TypeCode::Class => Ok(TypeDescriptor::Class {
                service: r.read_string()?,
                name: r.read_string()?,
            }),
            TypeCode::Enumeration => {
                let service = r.read_string()?;
                let name = r.read_string()?;
                let count = r.read_len_prefix()?;
                let mut entries = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let ordinal = r.read_svarint()?;
                    let ordinal = i32::try_from(ordinal)
                        .map_err(|_| MalformedFrameError::OrdinalOutOfRange(ordinal))?;
                    entries.push((ordinal, r.read_string()?));
                }
                Ok(TypeDescriptor::Enumeration {
                    service,
                    name,
                    values: EnumTable::new(entries),
                })
            }
            // Every other code was consumed by the kind tables above.
            _ => Err(MalformedFrameError::UnknownTypeCode(raw)),
        }
    }
}
