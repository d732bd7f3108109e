/// Size in bytes of the little-endian frame length prefix.
pub const FRAME_LENGTH_FIELD_SIZE: usize = 4;

/// Upper bound on a single frame payload, applied to the frame length prefix
/// and to every length prefix inside a payload. Anything larger is treated
/// as a malformed frame rather than an allocation request.
pub const MAX_FRAME_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Maximum nesting depth of a type descriptor. Catalog metadata deeper than
/// this is rejected when a `DecodeSpec` is built.
pub const MAX_TYPE_DEPTH: usize = 5;

/// First bytes of every connection handshake request.
pub const CONNECTION_MAGIC: [u8; 4] = *b"WCL1";

/// Size in bytes of the client identifier issued by the control handshake.
pub const CLIENT_ID_SIZE: usize = 16;

/// Name of the built-in service that carries protocol-level procedures.
pub const CORE_SERVICE: &str = "core";

/// Built-in procedure returning the encoded service catalog.
pub const CORE_GET_SERVICES: &str = "get_services";

/// Built-in procedure registering a call as a server-push stream.
pub const CORE_ADD_STREAM: &str = "add_stream";

/// Built-in procedure dropping a server-push stream by identifier.
pub const CORE_REMOVE_STREAM: &str = "remove_stream";
