use crate::constants::{FRAME_LENGTH_FIELD_SIZE, MAX_FRAME_PAYLOAD_SIZE};
use crate::wire::MalformedFrameError;

/// Length-prefix framing shared by both connections.
///
/// Every message travels as a little-endian `u32` payload length followed by
/// the payload bytes. The framing carries no kind byte; the payload type is
/// fixed by connection and direction.
pub struct FrameCodec;

impl FrameCodec {
    pub fn encode(payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_LENGTH_FIELD_SIZE + payload.len());
        buf.extend(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }
}

/// Incremental frame reassembly over an unframed byte stream.
///
/// Transport reads hand over whatever bytes arrived; complete frame payloads
/// come back in order. An oversized length prefix is unrecoverable because
/// the stream position can no longer be trusted.
#[derive(Debug, Default)]
pub struct FrameStreamDecoder {
    buffer: Vec<u8>,
}

impl FrameStreamDecoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Number of buffered bytes awaiting a complete frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn push_bytes(&mut self, input: &[u8]) -> Result<Vec<Vec<u8>>, MalformedFrameError> {
        self.buffer.extend_from_slice(input);

        let mut frames = Vec::new();
        loop {
            if self.buffer.len() < FRAME_LENGTH_FIELD_SIZE {
                return Ok(frames);
            }

            let len = u32::from_le_bytes(
                self.buffer[..FRAME_LENGTH_FIELD_SIZE]
                    .try_into()
                    .expect("length checked"),
            ) as usize;
            if len > MAX_FRAME_PAYLOAD_SIZE {
                return Err(MalformedFrameError::PayloadTooLarge(len as u64));
            }

            if self.buffer.len() < FRAME_LENGTH_FIELD_SIZE + len {
                return Ok(frames);
            }

            let payload = self.buffer[FRAME_LENGTH_FIELD_SIZE..FRAME_LENGTH_FIELD_SIZE + len].to_vec();
            self.buffer.drain(..FRAME_LENGTH_FIELD_SIZE + len);
            frames.push(payload);
        }
    }
}
