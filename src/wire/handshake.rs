use crate::codec::{ByteReader, ByteWriter};
use crate::constants::CONNECTION_MAGIC;
use crate::wire::MalformedFrameError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Which channel a connection wants to become.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum ConnectionKind {
    /// Request/response channel; the handshake reply issues a client id.
    Control = 0,
    /// Server-push channel; authenticates with the control channel's id.
    Stream = 1,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum HandshakeStatus {
    Ok = 0,
    Rejected = 1,
}

/// First frame the client sends on any connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub kind: ConnectionKind,
    /// Empty for control connections; the control channel's identifier for
    /// stream connections.
    pub client_id: Vec<u8>,
}

impl ConnectionRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_raw(&CONNECTION_MAGIC);
        w.put_u8(self.kind.into());
        w.put_bytes(&self.client_id);
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedFrameError> {
        let mut r = ByteReader::new(bytes);
        if r.read_exact(CONNECTION_MAGIC.len())? != CONNECTION_MAGIC {
            return Err(MalformedFrameError::BadMagic);
        }
        let kind_byte = r.read_u8()?;
        let kind = ConnectionKind::try_from(kind_byte)
            .map_err(|_| MalformedFrameError::UnknownFlags(kind_byte))?;
        let client_id = r.read_bytes()?;
        r.expect_end()?;
        Ok(ConnectionRequest { kind, client_id })
    }
}

/// First frame the server sends back on any connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReply {
    pub status: HandshakeStatus,
    /// The issued client identifier (control connections only).
    pub client_id: Vec<u8>,
    /// Human-readable rejection reason, empty on success.
    pub message: String,
}

impl ConnectionReply {
    pub fn ok(client_id: Vec<u8>) -> Self {
        Self {
            status: HandshakeStatus::Ok,
            client_id,
            message: String::new(),
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            status: HandshakeStatus::Rejected,
            client_id: Vec::new(),
            message: message.to_string(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_u8(self.status.into());
        w.put_bytes(&self.client_id);
        w.put_string(&self.message);
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedFrameError> {
        let mut r = ByteReader::new(bytes);
        let status_byte = r.read_u8()?;
        let status = HandshakeStatus::try_from(status_byte)
            .map_err(|_| MalformedFrameError::UnknownFlags(status_byte))?;
        let client_id = r.read_bytes()?;
        let message = r.read_string()?;
        r.expect_end()?;
        Ok(ConnectionReply {
            status,
            client_id,
            message,
        })
    }
}
