use crate::codec::{ByteReader, ByteWriter};
use crate::wire::{MalformedFrameError, ProcedureResult};

/// One push update: the server-assigned stream identifier plus the same
/// result shape a call would produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    pub stream_id: u64,
    pub result: ProcedureResult,
}

/// A push frame from the stream connection, carrying one or more updates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamFrame {
    pub updates: Vec<StreamUpdate>,
}

impl StreamFrame {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_uvarint(self.updates.len() as u64);
        for update in &self.updates {
            w.put_uvarint(update.stream_id);
            update.result.encode_into(&mut w);
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedFrameError> {
        let mut r = ByteReader::new(bytes);
        let update_count = r.read_len_prefix()?;
        let mut updates = Vec::with_capacity(update_count.min(1024));
        for _ in 0..update_count {
            updates.push(StreamUpdate {
                stream_id: r.read_uvarint()?,
                result: ProcedureResult::decode_from(&mut r)?,
            });
        }
        r.expect_end()?;
        Ok(StreamFrame { updates })
    }
}
