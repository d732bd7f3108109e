mod decode_spec;
mod schema_error;
mod service_catalog;
mod type_descriptor;
mod value;

pub use decode_spec::DecodeSpec;
pub use schema_error::{DecodeMismatchError, EncodeMismatchError, SpecBuildError};
pub use service_catalog::{Parameter, Procedure, Service, ServiceCatalog};
pub use type_descriptor::{
    CollectionKind, EnumTable, MessageKind, ScalarKind, TypeCode, TypeDescriptor,
};
pub use value::{ObjectHandle, Value, encode_value};
