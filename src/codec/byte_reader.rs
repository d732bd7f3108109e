use crate::codec::varint::{MAX_UVARINT_LEN, zigzag_decode};
use crate::codec::CodecError;
use crate::constants::MAX_FRAME_PAYLOAD_SIZE;

/// Cursor over a received payload.
///
/// Mirrors [`super::ByteWriter`] operation for operation. All reads bounds
/// check against the remaining input; length prefixes are additionally
/// capped at `MAX_FRAME_PAYLOAD_SIZE` so a corrupt prefix cannot drive an
/// allocation.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails unless the whole input has been consumed.
    pub fn expect_end(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let byte = *self.buf.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_uvarint(&mut self) -> Result<u64, CodecError> {
        let mut value: u64 = 0;
        for i in 0..MAX_UVARINT_LEN {
            let byte = self.read_u8()?;
            let bits = u64::from(byte & 0x7f);
            // The tenth byte may only carry the final single bit of a u64.
            if i == MAX_UVARINT_LEN - 1 && byte > 0x01 {
                return Err(CodecError::VarintOverflow);
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarintOverflow)
    }

    pub fn read_svarint(&mut self) -> Result<i64, CodecError> {
        Ok(zigzag_decode(self.read_uvarint()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        let bytes = self.read_exact(8)?;
        Ok(f64::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        let bytes = self.read_exact(4)?;
        Ok(f32::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_uvarint()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    /// Varint length prefix validated against the payload bound.
    pub fn read_len_prefix(&mut self) -> Result<usize, CodecError> {
        let len = self.read_uvarint()?;
        if len > MAX_FRAME_PAYLOAD_SIZE as u64 {
            return Err(CodecError::LengthOverflow(len));
        }
        Ok(len as usize)
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_len_prefix()?;
        let bytes = self.read_exact(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_len_prefix()?;
        Ok(self.read_exact(len)?.to_vec())
    }
}
