//! Packet parser: scans a buffer into data blocks and drives the record
//! decoder over each block payload.

use crate::error::AsterixError;
use crate::registry::Registry;
use crate::tree::{DataBlock, ParsedData};

use super::record::decode_record;

/// Defensive cap on the bytes examined per call. The transport layers are
/// expected to enforce this bound themselves; the core re-checks it.
pub const MAX_BUFFER_BYTES: usize = 65_536;

/// Defensive cap on the blocks decoded per call.
pub const MAX_BLOCKS_PER_CALL: usize = 10_000;

/// Wire header: category octet plus big-endian length.
const BLOCK_HEADER_LEN: usize = 3;

enum BlockStep {
    /// Cursor reached the end of the buffer.
    Done,
    Block(DataBlock, usize),
    /// Block carried an unloaded category; skipped whole.
    Skip {
        category: u8,
        length: usize,
        new_cursor: usize,
    },
    /// Header inconsistent with the buffer; scanning cannot continue.
    Fail {
        category: Option<u8>,
        error: AsterixError,
    },
}

fn next_block_step(
    registry: &Registry,
    bytes: &[u8],
    cursor: usize,
    timestamp_ms: u64,
) -> BlockStep {
    if cursor >= bytes.len() {
        return BlockStep::Done;
    }
    if bytes.len() - cursor < BLOCK_HEADER_LEN {
        return BlockStep::Fail {
            category: None,
            error: AsterixError::Truncated {
                needed: BLOCK_HEADER_LEN,
                available: bytes.len() - cursor,
            },
        };
    }

    let category = bytes[cursor];
    let length = u16::from_be_bytes([bytes[cursor + 1], bytes[cursor + 2]]) as usize;

    if length < BLOCK_HEADER_LEN {
        return BlockStep::Fail {
            category: Some(category),
            error: AsterixError::invalid(format!(
                "data block length {length} shorter than its own header"
            )),
        };
    }
    if cursor + length > bytes.len() {
        return BlockStep::Fail {
            category: Some(category),
            error: AsterixError::Truncated {
                needed: length,
                available: bytes.len() - cursor,
            },
        };
    }

    // Categories in a block header are always <= 255, so the lookup
    // cannot alias the internal BDS slot.
    let Some(cat) = registry.category(category as u16) else {
        return BlockStep::Skip {
            category,
            length: length - BLOCK_HEADER_LEN,
            new_cursor: cursor + length,
        };
    };

    let payload = &bytes[cursor + BLOCK_HEADER_LEN..cursor + length];
    let block = decode_block(registry, cat, payload, timestamp_ms);
    BlockStep::Block(block, cursor + length)
}

fn decode_block(
    registry: &Registry,
    cat: &crate::schema::Category,
    payload: &[u8],
    timestamp_ms: u64,
) -> DataBlock {
    let category = cat.id as u8;

    let mut block = DataBlock {
        category,
        length: payload.len(),
        timestamp_ms,
        format_ok: true,
        records: Vec::new(),
    };

    let mut cursor = 0;
    while cursor < payload.len() {
        let rest = &payload[cursor..];
        let Some(uap) = cat.select_uap(rest) else {
            log::warn!("category {category}: no UAP matches the record, abandoning block");
            block.format_ok = false;
            break;
        };

        let (record, error) = decode_record(registry, cat, uap, rest, timestamp_ms);
        let consumed = record.length;
        let ok = record.format_ok;
        block.records.push(record);

        if let Some(error) = error {
            log::debug!("category {category}: record decode failed: {error}");
            block.format_ok = false;
            break;
        }
        // A record always consumes at least its FSPEC octet; this guards
        // the loop against a schema that would decode nothing.
        if consumed == 0 || !ok {
            block.format_ok = false;
            break;
        }
        cursor += consumed;
    }

    block
}

/// Parses every data block in `bytes` until the end of the buffer or the
/// first unrecoverable framing error.
///
/// Blocks of unloaded categories are skipped (a record-less block with
/// `format_ok = false` marks the spot); a framing error produces a final
/// failed block entry and stops the scan. Oversized input is clamped to
/// [`MAX_BUFFER_BYTES`].
pub fn parse(registry: &Registry, bytes: &[u8], timestamp_ms: u64) -> ParsedData {
    let bytes = clamp_buffer(bytes);
    let mut parsed = ParsedData::default();
    let mut cursor = 0;

    for _ in 0..MAX_BLOCKS_PER_CALL {
        match next_block_step(registry, bytes, cursor, timestamp_ms) {
            BlockStep::Done => break,
            BlockStep::Block(block, new_cursor) => {
                parsed.blocks.push(block);
                cursor = new_cursor;
            }
            BlockStep::Skip {
                category,
                length,
                new_cursor,
            } => {
                log::warn!("skipping {length}-byte block of unknown category {category}");
                parsed.blocks.push(DataBlock {
                    category,
                    length,
                    timestamp_ms,
                    format_ok: false,
                    records: Vec::new(),
                });
                cursor = new_cursor;
            }
            BlockStep::Fail { category, error } => {
                log::warn!("data block scan stopped: {error}");
                parsed.blocks.push(DataBlock {
                    category: category.unwrap_or(0),
                    length: 0,
                    timestamp_ms,
                    format_ok: false,
                    records: Vec::new(),
                });
                break;
            }
        }
    }

    parsed
}

/// Parses one data block at `cursor`, for callers that drive the scan
/// loop themselves.
///
/// Returns the block (or `None` at the end of the buffer) and the new
/// cursor. Unknown categories and framing errors are returned as errors;
/// after [`AsterixError::UnknownCategory`] the cursor in the error path
/// has already skipped the block, so the returned cursor still advances.
pub fn parse_next_block(
    registry: &Registry,
    bytes: &[u8],
    cursor: usize,
    timestamp_ms: u64,
) -> Result<(Option<DataBlock>, usize), AsterixError> {
    match next_block_step(registry, bytes, cursor, timestamp_ms) {
        BlockStep::Done => Ok((None, cursor)),
        BlockStep::Block(block, new_cursor) => Ok((Some(block), new_cursor)),
        BlockStep::Skip { category, .. } => Err(AsterixError::UnknownCategory(category)),
        BlockStep::Fail { error, .. } => Err(error),
    }
}

/// Parses up to `max_blocks` blocks starting at `offset` (`0` = all).
///
/// Returns the parsed blocks, the bytes consumed from `offset`, and an
/// estimate of the complete blocks remaining after the consumed range.
pub fn parse_with_offset(
    registry: &Registry,
    bytes: &[u8],
    offset: usize,
    max_blocks: usize,
    timestamp_ms: u64,
) -> Result<(ParsedData, usize, usize), AsterixError> {
    if offset >= bytes.len() {
        return Err(AsterixError::Overflow);
    }
    if bytes.len() > MAX_BUFFER_BYTES {
        return Err(AsterixError::invalid(format!(
            "buffer of {} bytes exceeds the {MAX_BUFFER_BYTES}-byte limit",
            bytes.len()
        )));
    }

    let budget = if max_blocks == 0 {
        MAX_BLOCKS_PER_CALL
    } else {
        max_blocks.min(MAX_BLOCKS_PER_CALL)
    };

    let mut parsed = ParsedData::default();
    let mut cursor = offset;

    for _ in 0..budget {
        match next_block_step(registry, bytes, cursor, timestamp_ms) {
            BlockStep::Done => break,
            BlockStep::Block(block, new_cursor) => {
                parsed.blocks.push(block);
                cursor = new_cursor;
            }
            BlockStep::Skip {
                category,
                length,
                new_cursor,
            } => {
                log::warn!("skipping {length}-byte block of unknown category {category}");
                parsed.blocks.push(DataBlock {
                    category,
                    length,
                    timestamp_ms,
                    format_ok: false,
                    records: Vec::new(),
                });
                cursor = new_cursor;
            }
            BlockStep::Fail { category, error } => {
                log::warn!("data block scan stopped: {error}");
                parsed.blocks.push(DataBlock {
                    category: category.unwrap_or(0),
                    length: 0,
                    timestamp_ms,
                    format_ok: false,
                    records: Vec::new(),
                });
                cursor = bytes.len();
                break;
            }
        }
    }

    Ok((parsed, cursor - offset, estimate_blocks(bytes, cursor)))
}

/// Counts the block headers reachable from `cursor` without decoding
/// payloads. Stops at the first inconsistent header.
fn estimate_blocks(bytes: &[u8], mut cursor: usize) -> usize {
    let mut count = 0;
    while count < MAX_BLOCKS_PER_CALL && bytes.len() - cursor >= BLOCK_HEADER_LEN {
        let length = u16::from_be_bytes([bytes[cursor + 1], bytes[cursor + 2]]) as usize;
        if length < BLOCK_HEADER_LEN || cursor + length > bytes.len() {
            break;
        }
        cursor += length;
        count += 1;
    }
    count
}

fn clamp_buffer(bytes: &[u8]) -> &[u8] {
    if bytes.len() > MAX_BUFFER_BYTES {
        log::warn!(
            "buffer of {} bytes clamped to the {MAX_BUFFER_BYTES}-byte limit",
            bytes.len()
        );
        &bytes[..MAX_BUFFER_BYTES]
    } else {
        bytes
    }
}
