use crate::schema::{EncodeMismatchError, TypeDescriptor, Value, encode_value};
use crate::wire::{Argument, ProcedureCall};

/// Assembles a symbolic (service, procedure, arguments) triple into a wire
/// call.
///
/// Positions are assigned sequentially from zero over the logical argument
/// list. Every attached argument is encoded against its declared descriptor
/// up front, so a mismatched value fails before any network I/O.
#[derive(Debug)]
pub struct CallBuilder {
    service: String,
    procedure: String,
    arguments: Vec<Argument>,
    next_position: u32,
}

impl CallBuilder {
    pub fn new(service: &str, procedure: &str) -> Self {
        Self {
            service: service.to_string(),
            procedure: procedure.to_string(),
            arguments: Vec::new(),
            next_position: 0,
        }
    }

    /// Encodes `value` against `descriptor` and attaches it at the next
    /// position.
    pub fn argument(
        mut self,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> Result<Self, EncodeMismatchError> {
        let encoded = encode_value(value, descriptor)?;
        self.arguments.push(Argument {
            position: self.next_position,
            value: encoded,
        });
        self.next_position += 1;
        Ok(self)
    }

    /// Attaches pre-encoded bytes at the next position. Used where the
    /// argument is itself a protocol message (a stream's target call).
    pub fn raw_argument(mut self, bytes: Vec<u8>) -> Self {
        self.arguments.push(Argument {
            position: self.next_position,
            value: bytes,
        });
        self.next_position += 1;
        self
    }

    /// Advances the position without attaching anything: the argument is
    /// absent and the server substitutes its default.
    pub fn default_argument(mut self) -> Self {
        self.next_position += 1;
        self
    }

    pub fn build(self) -> ProcedureCall {
        ProcedureCall {
            service: self.service,
            procedure: self.procedure,
            arguments: self.arguments,
        }
    }
}
