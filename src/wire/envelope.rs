use crate::codec::{ByteReader, ByteWriter};
use crate::wire::MalformedFrameError;

const FLAG_HAS_VALUE: u8 = 0b01;
const FLAG_HAS_ERROR: u8 = 0b10;

/// One positional argument, already encoded against its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub position: u32,
    pub value: Vec<u8>,
}

/// One remote invocation: service, procedure, positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    pub service: String,
    pub procedure: String,
    pub arguments: Vec<Argument>,
}

impl ProcedureCall {
    pub fn encode_into(&self, w: &mut ByteWriter) {
        w.put_string(&self.service);
        w.put_string(&self.procedure);
        w.put_uvarint(self.arguments.len() as u64);
        for argument in &self.arguments {
            w.put_uvarint(u64::from(argument.position));
            w.put_bytes(&argument.value);
        }
    }

    /// Standalone encoding, used when a call travels as an argument itself
    /// (the stream-registration sub-protocol).
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.encode_into(&mut w);
        w.into_bytes()
    }

    pub fn decode_from(r: &mut ByteReader) -> Result<Self, MalformedFrameError> {
        let service = r.read_string()?;
        let procedure = r.read_string()?;
        let argument_count = r.read_len_prefix()?;
        let mut arguments = Vec::with_capacity(argument_count.min(1024));
        for _ in 0..argument_count {
            let position = r.read_uvarint()?;
            let position = u32::try_from(position)
                .map_err(|_| MalformedFrameError::Codec(crate::codec::CodecError::VarintOverflow))?;
            arguments.push(Argument {
                position,
                value: r.read_bytes()?,
            });
        }
        Ok(ProcedureCall {
            service,
            procedure,
            arguments,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedFrameError> {
        let mut r = ByteReader::new(bytes);
        let call = Self::decode_from(&mut r)?;
        r.expect_end()?;
        Ok(call)
    }
}

/// An ordered batch of calls. Order is the correlation key: result *i* of
/// the matching [`Response`] answers call *i*.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    pub calls: Vec<ProcedureCall>,
}

impl Request {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_uvarint(self.calls.len() as u64);
        for call in &self.calls {
            call.encode_into(&mut w);
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedFrameError> {
        let mut r = ByteReader::new(bytes);
        let call_count = r.read_len_prefix()?;
        let mut calls = Vec::with_capacity(call_count.min(1024));
        for _ in 0..call_count {
            calls.push(ProcedureCall::decode_from(&mut r)?);
        }
        r.expect_end()?;
        Ok(Request { calls })
    }
}

/// The outcome of one call: value bytes, a server-reported error, or both
/// absent (a procedure that returns nothing).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcedureResult {
    pub value: Option<Vec<u8>>,
    pub error: Option<String>,
}

impl ProcedureResult {
    pub fn ok(value: Vec<u8>) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            value: None,
            error: Some(message.to_string()),
        }
    }

    pub fn encode_into(&self, w: &mut ByteWriter) {
        let mut flags = 0u8;
        if self.value.is_some() {
            flags |= FLAG_HAS_VALUE;
        }
        if self.error.is_some() {
            flags |= FLAG_HAS_ERROR;
        }
        w.put_u8(flags);
        if let Some(value) = &self.value {
            w.put_bytes(value);
        }
        if let Some(error) = &self.error {
            w.put_string(error);
        }
    }

    pub fn decode_from(r: &mut ByteReader) -> Result<Self, MalformedFrameError> {
        let flags = r.read_u8()?;
        if flags & !(FLAG_HAS_VALUE | FLAG_HAS_ERROR) != 0 {
            return Err(MalformedFrameError::UnknownFlags(flags));
        }
        let value = if flags & FLAG_HAS_VALUE != 0 {
            Some(r.read_bytes()?)
        } else {
            None
        };
        let error = if flags & FLAG_HAS_ERROR != 0 {
            Some(r.read_string()?)
        } else {
            None
        };
        Ok(ProcedureResult { value, error })
    }
}

/// The ordered results answering one [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    pub results: Vec<ProcedureResult>,
}

impl Response {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_uvarint(self.results.len() as u64);
        for result in &self.results {
            result.encode_into(&mut w);
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedFrameError> {
        let mut r = ByteReader::new(bytes);
        let result_count = r.read_len_prefix()?;
        let mut results = Vec::with_capacity(result_count.min(1024));
        for _ in 0..result_count {
            results.push(ProcedureResult::decode_from(&mut r)?);
        }
        r.expect_end()?;
        Ok(Response { results })
    }
}
