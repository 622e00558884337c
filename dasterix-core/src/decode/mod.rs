//! The decode pipeline: format interpreters, record decoder, packet
//! parser.

mod format;
mod packet;
mod record;

pub use format::{DecodeContext, decode_format, width_hint};
pub use packet::{
    MAX_BLOCKS_PER_CALL, MAX_BUFFER_BYTES, parse, parse_next_block, parse_with_offset,
};
pub use record::decode_record;
