mod byte_reader;
mod byte_writer;
mod codec_error;
mod varint;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use codec_error::CodecError;
pub use varint::{zigzag_decode, zigzag_encode};
