mod envelope;
mod frame_codec;
mod handshake;
mod stream_frame;
mod wire_error;

pub use envelope::{Argument, ProcedureCall, ProcedureResult, Request, Response};
pub use frame_codec::{FrameCodec, FrameStreamDecoder};
pub use handshake::{ConnectionKind, ConnectionReply, ConnectionRequest, HandshakeStatus};
pub use stream_frame::{StreamFrame, StreamUpdate};
pub use wire_error::MalformedFrameError;
