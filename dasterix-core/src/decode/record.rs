//! Record decoder: FSPEC scan, UAP-driven item iteration.

use crate::error::AsterixError;
use crate::fspec::Fspec;
use crate::registry::Registry;
use crate::schema::{Category, Uap, UapSlot};
use crate::tree::{Item, Record};

use super::format::{DecodeContext, decode_format};

/// Decodes one record at the start of `payload`.
///
/// On success the record covers exactly the bytes its FSPEC selected and
/// `format_ok` is true. On failure the items decoded so far are kept,
/// `format_ok` is false, the record is charged the whole remaining
/// payload (the caller abandons the block), and the error is returned
/// alongside.
pub fn decode_record(
    registry: &Registry,
    category: &Category,
    uap: &Uap,
    payload: &[u8],
    timestamp_ms: u64,
) -> (Record, Option<AsterixError>) {
    let ctx = DecodeContext { registry };

    let mut items = Vec::new();
    let result = decode_items(category, uap, payload, &ctx, &mut items);

    match result {
        Ok(consumed) => (
            finish_record(category, &payload[..consumed], timestamp_ms, items, true),
            None,
        ),
        Err(err) => (
            finish_record(category, payload, timestamp_ms, items, false),
            Some(err),
        ),
    }
}

fn decode_items(
    category: &Category,
    uap: &Uap,
    payload: &[u8],
    ctx: &DecodeContext<'_>,
    items: &mut Vec<Item>,
) -> Result<usize, AsterixError> {
    let fspec = Fspec::read(payload, uap.max_fspec_bytes())?;
    let mut cursor = fspec.len();

    for frn in fspec.frns() {
        let entry = uap.entry(frn).ok_or_else(|| {
            AsterixError::invalid(format!("FSPEC selects FRN {frn} beyond the UAP"))
        })?;

        match &entry.slot {
            UapSlot::Fx => unreachable!("frns() never yields FX positions"),
            UapSlot::Spare => continue,
            UapSlot::Item(id) => {
                let item = category.item(id).ok_or_else(|| AsterixError::SchemaMismatch {
                    category: category.id,
                    frn,
                    item: id.clone(),
                })?;
                let (fields, consumed) = decode_format(&item.format, &payload[cursor..], ctx)?;
                cursor += consumed;
                items.push(Item {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    fields,
                });
            }
        }
    }

    Ok(cursor)
}

fn finish_record(
    category: &Category,
    bytes: &[u8],
    timestamp_ms: u64,
    items: Vec<Item>,
    format_ok: bool,
) -> Record {
    Record {
        category: category.id as u8,
        timestamp_ms,
        length: bytes.len(),
        crc: crc32fast::hash(bytes),
        hex: hex::encode_upper(bytes),
        format_ok,
        items,
    }
}
