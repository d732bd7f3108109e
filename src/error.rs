use crate::schema::{DecodeMismatchError, EncodeMismatchError, SpecBuildError};
use crate::wire::MalformedFrameError;
use std::fmt;

/// The user-visible failure kinds of the client.
///
/// `Transport` and `MalformedFrame` reject every call in the outstanding
/// batch; `Procedure` and `DecodeMismatch` are scoped to the single affected
/// call. The enum is `Clone` so one connection-level failure can be fanned
/// out to every pending call, and every call resolves or rejects exactly
/// once.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcError {
    /// Connection-level failure (I/O error, unexpected close).
    Transport(String),

    /// Response bytes did not parse as the wire envelope.
    MalformedFrame(MalformedFrameError),

    /// The server attached an error to this call's result.
    Procedure(String),

    /// Result bytes did not match the expected decode shape.
    DecodeMismatch(DecodeMismatchError),

    /// An argument value did not match its declared descriptor.
    EncodeMismatch(EncodeMismatchError),

    /// A return descriptor could not be compiled.
    SpecBuild(SpecBuildError),

    /// A stream with this name is already registered (client-local).
    DuplicateStreamName(String),

    /// No stream with this name is registered.
    NoSuchStream(String),

    /// The server refused the connection handshake.
    ConnectionRejected(String),

    /// A bound procedure was invoked with the wrong argument count.
    Arity {
        service: String,
        procedure: String,
        expected: usize,
        got: usize,
    },

    /// `send` was given no calls to transmit.
    EmptyBatch,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Transport(msg) => write!(f, "transport error: {}", msg),
            RpcError::MalformedFrame(e) => write!(f, "malformed frame: {}", e),
            RpcError::Procedure(msg) => write!(f, "procedure error: {}", msg),
            RpcError::DecodeMismatch(e) => write!(f, "decode mismatch: {}", e),
            RpcError::EncodeMismatch(e) => write!(f, "encode mismatch: {}", e),
            RpcError::SpecBuild(e) => write!(f, "descriptor rejected: {}", e),
            RpcError::DuplicateStreamName(name) => {
                write!(f, "stream name {:?} is already registered", name)
            }
            RpcError::NoSuchStream(name) => write!(f, "no stream registered as {:?}", name),
            RpcError::ConnectionRejected(msg) => write!(f, "connection rejected: {}", msg),
            RpcError::Arity {
                service,
                procedure,
                expected,
                got,
            } => write!(
                f,
                "{}.{} expects {} argument(s), got {}",
                service, procedure, expected, got
            ),
            RpcError::EmptyBatch => write!(f, "request batch contains no calls"),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RpcError::MalformedFrame(e) => Some(e),
            RpcError::DecodeMismatch(e) => Some(e),
            RpcError::EncodeMismatch(e) => Some(e),
            RpcError::SpecBuild(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MalformedFrameError> for RpcError {
    fn from(e: MalformedFrameError) -> Self {
        RpcError::MalformedFrame(e)
    }
}

impl From<DecodeMismatchError> for RpcError {
    fn from(e: DecodeMismatchError) -> Self {
        RpcError::DecodeMismatch(e)
    }
}

impl From<EncodeMismatchError> for RpcError {
    fn from(e: EncodeMismatchError) -> Self {
        RpcError::EncodeMismatch(e)
    }
}

impl From<SpecBuildError> for RpcError {
    fn from(e: SpecBuildError) -> Self {
        RpcError::SpecBuild(e)
    }
}

impl From<std::io::Error> for RpcError {
    fn from(e: std::io::Error) -> Self {
        RpcError::Transport(e.to_string())
    }
}
