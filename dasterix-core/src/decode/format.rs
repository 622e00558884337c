//! Interpreters for the six data-item format variants.
//!
//! Each decoder consumes a prefix of its input slice and reports how many
//! bytes it took; it never reads past the slice. The registry travels
//! through [`DecodeContext`] so the BDS decoder can resolve register
//! schemas without the schema tree holding back-references.

use crate::bit_reader;
use crate::error::AsterixError;
use crate::registry::{BDS_CATEGORY, Registry};
use crate::schema::{
    BDS_ITEM_LEN, BdsFormat, Bits, CompoundFormat, DataItemFormat, Encoding, ExplicitFormat,
    FixedFormat, RepetitiveFormat, VariableFormat,
};
use crate::tree::{Field, FieldKind, Leaf, RawValue};

/// Read-only state threaded through a decode run.
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    pub registry: &'a Registry,
}

/// Decodes one format at the start of `data`, returning the produced
/// fields and the number of bytes consumed.
pub fn decode_format(
    format: &DataItemFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<(Vec<Field>, usize), AsterixError> {
    match format {
        DataItemFormat::Fixed(fixed) => decode_fixed(fixed, data),
        DataItemFormat::Variable(var) => decode_variable(var, data),
        DataItemFormat::Compound(comp) => decode_compound(comp, data, ctx),
        DataItemFormat::Repetitive(rep) => decode_repetitive(rep, data, ctx),
        DataItemFormat::Explicit(exp) => decode_explicit(exp, data, ctx),
        DataItemFormat::Bds(bds) => decode_bds(bds, data, ctx),
    }
}

/// Expected byte count of `format` at the start of `data`.
///
/// Fixed needs no lookahead; the other variants inspect length octets,
/// FX chains or presence masks but never consume anything.
pub fn width_hint(
    format: &DataItemFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<usize, AsterixError> {
    match format {
        DataItemFormat::Fixed(fixed) => Ok(fixed.length),
        DataItemFormat::Variable(var) => variable_width(var, data),
        DataItemFormat::Compound(comp) => compound_width(comp, data, ctx),
        DataItemFormat::Repetitive(rep) => repetitive_width(rep, data, ctx),
        DataItemFormat::Explicit(_) => {
            let len = *data.first().ok_or(AsterixError::Truncated {
                needed: 1,
                available: 0,
            })? as usize;
            if len == 0 {
                return Err(AsterixError::invalid("Explicit length octet is zero"));
            }
            Ok(len)
        }
        DataItemFormat::Bds(_) => Ok(BDS_ITEM_LEN),
    }
}

fn need(data: &[u8], needed: usize) -> Result<(), AsterixError> {
    if data.len() < needed {
        return Err(AsterixError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

// --- Fixed ---------------------------------------------------------------

fn decode_fixed(fixed: &FixedFormat, data: &[u8]) -> Result<(Vec<Field>, usize), AsterixError> {
    need(data, fixed.length)?;
    let part = &data[..fixed.length];

    let mut fields = Vec::new();
    for bits in &fixed.bits {
        if bits.fx || bits.is_spare() {
            continue;
        }
        fields.push(Field::leaf(bits.short_name.clone(), decode_leaf(bits, part)?));
    }
    Ok((fields, fixed.length))
}

fn decode_leaf(bits: &Bits, part: &[u8]) -> Result<Leaf, AsterixError> {
    let raw = match bits.encoding {
        Encoding::SixBitsChar => {
            RawValue::Text(bit_reader::read_six_bit_ascii(part, bits.from, bits.to)?)
        }
        Encoding::Hex => RawValue::Bytes(bit_reader::read_bytes(part, bits.from, bits.to)?.to_vec()),
        Encoding::Signed => RawValue::Signed(bit_reader::read_signed(part, bits.from, bits.to)?),
        Encoding::Octal => RawValue::Octal(bit_reader::read_unsigned(part, bits.from, bits.to)?),
        Encoding::Unsigned | Encoding::Flag => {
            if bits.width() > 64 {
                RawValue::Bytes(bit_reader::read_bytes(part, bits.from, bits.to)?.to_vec())
            } else {
                RawValue::Unsigned(bit_reader::read_unsigned(part, bits.from, bits.to)?)
            }
        }
    };

    if let (Some(expected), Some(actual)) = (bits.expected, raw.as_i64()) {
        if expected != actual {
            log::debug!(
                "field {}: constant mismatch, expected {expected}, read {actual}",
                bits.short_name
            );
        }
    }

    let scaled = match (&raw, bits.scale) {
        (RawValue::Unsigned(v), Some(s)) => Some(*v as f64 * s),
        (RawValue::Signed(v), Some(s)) => Some(*v as f64 * s),
        _ => None,
    };
    let meaning = raw
        .as_i64()
        .and_then(|v| bits.meaning_of(v))
        .map(str::to_owned);

    Ok(Leaf {
        raw,
        scaled,
        meaning,
        unit: bits.unit.clone(),
    })
}

// --- Variable ------------------------------------------------------------

fn decode_variable(
    var: &VariableFormat,
    data: &[u8],
) -> Result<(Vec<Field>, usize), AsterixError> {
    let mut fields = Vec::new();
    let mut cursor = 0;

    for (i, part) in var.parts.iter().enumerate() {
        need(&data[cursor..], part.length)?;
        let (mut part_fields, consumed) = decode_fixed(part, &data[cursor..])?;
        fields.append(&mut part_fields);
        cursor += consumed;

        // The FX bit is the LSB of the part just consumed.
        if data[cursor - 1] & 0x01 == 0 {
            return Ok((fields, cursor));
        }
        if i + 1 == var.parts.len() {
            return Err(AsterixError::invalid(
                "FX extension beyond declared parts of Variable item",
            ));
        }
    }

    Err(AsterixError::invalid("Variable item declares no parts"))
}

fn variable_width(var: &VariableFormat, data: &[u8]) -> Result<usize, AsterixError> {
    let mut cursor = 0;
    for (i, part) in var.parts.iter().enumerate() {
        need(&data[cursor..], part.length)?;
        cursor += part.length;
        if data[cursor - 1] & 0x01 == 0 {
            return Ok(cursor);
        }
        if i + 1 == var.parts.len() {
            return Err(AsterixError::invalid(
                "FX extension beyond declared parts of Variable item",
            ));
        }
    }
    Err(AsterixError::invalid("Variable item declares no parts"))
}

// --- Compound ------------------------------------------------------------

/// Presence slots of a compound primary: every non-FX bit of the consumed
/// primary octets, MSB first, paired with the declared subfield name when
/// the primary grammar names that bit.
fn primary_slots(comp: &CompoundFormat, data: &[u8]) -> Result<(Vec<(bool, String)>, usize), AsterixError> {
    let mut slots = Vec::new();
    let mut cursor = 0;

    for (i, part) in comp.primary.parts.iter().enumerate() {
        need(&data[cursor..], part.length)?;
        let octets = &data[cursor..cursor + part.length];
        let total_bits = part.length * 8;

        // Walk MSB-first; the final LSB of the part is FX, not a slot.
        for bit_nr in (2..=total_bits).rev() {
            let set = bit_reader::read_unsigned(octets, bit_nr, bit_nr)? == 1;
            let name = part
                .bits
                .iter()
                .find(|b| !b.fx && b.from >= bit_nr && bit_nr >= b.to)
                .map(|b| b.short_name.clone())
                .unwrap_or_default();
            slots.push((set, name));
        }

        cursor += part.length;
        if octets[part.length - 1] & 0x01 == 0 {
            return Ok((slots, cursor));
        }
        if i + 1 == comp.primary.parts.len() {
            return Err(AsterixError::invalid(
                "FX extension beyond declared parts of Compound primary subfield",
            ));
        }
    }

    Err(AsterixError::invalid(
        "Compound item declares no primary subfield parts",
    ))
}

fn decode_compound(
    comp: &CompoundFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<(Vec<Field>, usize), AsterixError> {
    let (slots, mut cursor) = primary_slots(comp, data)?;

    let mut fields = Vec::new();
    for (slot, (set, name)) in slots.iter().enumerate() {
        if !set {
            continue;
        }
        let sub = comp.parts.get(slot).ok_or_else(|| {
            AsterixError::invalid(format!(
                "Compound presence bit {} has no declared subfield",
                slot + 1
            ))
        })?;
        let (sub_fields, consumed) = decode_format(sub, &data[cursor..], ctx)?;
        cursor += consumed;

        let name = if name.is_empty() {
            format!("SF{}", slot + 1)
        } else {
            name.clone()
        };
        fields.push(Field::group(name, sub_fields));
    }
    Ok((fields, cursor))
}

fn compound_width(
    comp: &CompoundFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<usize, AsterixError> {
    let (slots, mut cursor) = primary_slots(comp, data)?;
    for (slot, (set, _)) in slots.iter().enumerate() {
        if !set {
            continue;
        }
        let sub = comp.parts.get(slot).ok_or_else(|| {
            AsterixError::invalid(format!(
                "Compound presence bit {} has no declared subfield",
                slot + 1
            ))
        })?;
        cursor += width_hint(sub, &data[cursor..], ctx)?;
    }
    Ok(cursor)
}

// --- Repetitive ----------------------------------------------------------

fn decode_repetitive(
    rep: &RepetitiveFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<(Vec<Field>, usize), AsterixError> {
    need(data, 1)?;
    let count = data[0] as usize;
    let mut cursor = 1;

    let mut repetitions = Vec::with_capacity(count);
    for _ in 0..count {
        let mut rep_fields = Vec::new();
        for part in &rep.parts {
            let (mut fields, consumed) = decode_format(part, &data[cursor..], ctx)?;
            rep_fields.append(&mut fields);
            cursor += consumed;
        }
        repetitions.push(rep_fields);
    }

    let field = Field {
        name: String::new(),
        kind: FieldKind::List(repetitions),
    };
    Ok((vec![field], cursor))
}

fn repetitive_width(
    rep: &RepetitiveFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<usize, AsterixError> {
    need(data, 1)?;
    let count = data[0] as usize;
    let mut cursor = 1;
    for _ in 0..count {
        for part in &rep.parts {
            cursor += width_hint(part, &data[cursor..], ctx)?;
        }
    }
    Ok(cursor)
}

// --- Explicit ------------------------------------------------------------

fn decode_explicit(
    exp: &ExplicitFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<(Vec<Field>, usize), AsterixError> {
    need(data, 1)?;
    let len = data[0] as usize;
    if len == 0 {
        return Err(AsterixError::invalid("Explicit length octet is zero"));
    }
    need(data, len)?;
    let payload = &data[1..len];

    let fields = match exp.inner.as_deref() {
        None => vec![Field::leaf(
            "data",
            Leaf {
                raw: RawValue::Bytes(payload.to_vec()),
                scaled: None,
                meaning: None,
                unit: String::new(),
            },
        )],
        Some(inner) => {
            let (fields, consumed) = decode_format(inner, payload, ctx)?;
            if consumed != payload.len() {
                return Err(AsterixError::invalid(format!(
                    "Explicit payload of {} bytes only {} consumed",
                    payload.len(),
                    consumed
                )));
            }
            fields
        }
    };
    Ok((fields, len))
}

// --- BDS -----------------------------------------------------------------

fn decode_bds(
    _bds: &BdsFormat,
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<(Vec<Field>, usize), AsterixError> {
    need(data, BDS_ITEM_LEN)?;
    let register = data[0];
    let key = format!("{register:02X}");
    let payload = &data[1..BDS_ITEM_LEN];

    let schema = ctx
        .registry
        .category(BDS_CATEGORY)
        .and_then(|cat| cat.item(&key));

    let field = match schema {
        Some(item) => {
            let (fields, _) = decode_format(&item.format, payload, ctx)?;
            Field::group(format!("BDS{key}"), fields)
        }
        None => {
            log::debug!("no schema for BDS register {key}, keeping raw octets");
            Field::leaf(
                format!("BDS{key}"),
                Leaf {
                    raw: RawValue::Bytes(payload.to_vec()),
                    scaled: None,
                    meaning: None,
                    unit: String::new(),
                },
            )
        }
    };
    Ok((vec![field], BDS_ITEM_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BitsValue, Category, DataItemDescription, Rule};

    fn bits(short: &str, from: usize, to: usize) -> Bits {
        let mut b = Bits::new(from, to);
        b.short_name = short.into();
        b.name = short.into();
        b
    }

    fn sac_sic() -> FixedFormat {
        let mut fixed = FixedFormat::new(2);
        fixed.bits.push(bits("SAC", 16, 9));
        fixed.bits.push(bits("SIC", 8, 1));
        fixed
    }

    fn empty_registry() -> Registry {
        Registry::new()
    }

    fn leaf_unsigned(field: &Field) -> u64 {
        match &field.kind {
            FieldKind::Leaf(Leaf {
                raw: RawValue::Unsigned(v),
                ..
            }) => *v,
            other => panic!("expected unsigned leaf, got {other:?}"),
        }
    }

    #[test]
    fn fixed_decodes_leaves_in_order() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Fixed(sac_sic());

        let (fields, consumed) = decode_format(&format, &[0x01, 0x23, 0xFF], &ctx).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "SAC");
        assert_eq!(leaf_unsigned(&fields[0]), 1);
        assert_eq!(fields[1].name, "SIC");
        assert_eq!(leaf_unsigned(&fields[1]), 0x23);
    }

    #[test]
    fn fixed_truncated() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Fixed(sac_sic());
        let err = decode_format(&format, &[0x01], &ctx).unwrap_err();
        assert!(matches!(
            err,
            AsterixError::Truncated {
                needed: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn fixed_applies_scale_and_meaning() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let mut fixed = FixedFormat::new(1);
        let mut b = bits("RHO", 8, 1);
        b.scale = Some(1.0 / 256.0);
        b.unit = "NM".into();
        b.values.push(BitsValue {
            value: 128,
            meaning: "half mile".into(),
        });
        fixed.bits.push(b);
        let format = DataItemFormat::Fixed(fixed);

        let (fields, _) = decode_format(&format, &[128], &ctx).unwrap();
        let FieldKind::Leaf(leaf) = &fields[0].kind else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.scaled, Some(0.5));
        assert_eq!(leaf.meaning.as_deref(), Some("half mile"));
        assert_eq!(leaf.unit, "NM");
    }

    #[test]
    fn fixed_skips_spare_and_fx() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let mut fixed = FixedFormat::new(1);
        fixed.bits.push(bits("CODE", 8, 2));
        let mut fx = bits("FX", 1, 1);
        fx.fx = true;
        fixed.bits.push(fx);
        let mut spare = bits("spare", 8, 2);
        spare.short_name = "spare".into();
        fixed.bits.push(spare);
        let format = DataItemFormat::Fixed(fixed);

        let (fields, _) = decode_format(&format, &[0xFF], &ctx).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "CODE");
    }

    fn two_part_variable() -> VariableFormat {
        let mut first = FixedFormat::new(1);
        first.bits.push(bits("A", 8, 2));
        let mut fx = bits("FX", 1, 1);
        fx.fx = true;
        first.bits.push(fx);

        let mut second = FixedFormat::new(1);
        second.bits.push(bits("B", 8, 2));
        let mut fx2 = bits("FX", 1, 1);
        fx2.fx = true;
        second.bits.push(fx2);

        VariableFormat {
            parts: vec![first, second],
        }
    }

    #[test]
    fn variable_stops_on_clear_fx() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Variable(two_part_variable());

        let (fields, consumed) = decode_format(&format, &[0x54, 0xFF], &ctx).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "A");
    }

    #[test]
    fn variable_chains_on_fx() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Variable(two_part_variable());

        let (fields, consumed) = decode_format(&format, &[0x55, 0x54], &ctx).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].name, "B");
    }

    #[test]
    fn variable_overrun_is_invalid() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Variable(two_part_variable());

        // FX set on the second (last declared) part.
        let err = decode_format(&format, &[0x55, 0x55], &ctx).unwrap_err();
        assert!(matches!(err, AsterixError::Invalid(_)));
        assert!(err.to_string().contains("extension beyond declared parts"));
    }

    #[test]
    fn variable_truncated_mid_chain() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Variable(two_part_variable());
        let err = decode_format(&format, &[0x55], &ctx).unwrap_err();
        assert!(matches!(err, AsterixError::Truncated { .. }));
    }

    fn compound_two_subfields() -> CompoundFormat {
        // Primary: one octet, slots COM (bit 8) and PSR (bit 7).
        let mut primary_part = FixedFormat::new(1);
        primary_part.bits.push(bits("COM", 8, 8));
        primary_part.bits.push(bits("PSR", 7, 7));
        let mut fx = bits("FX", 1, 1);
        fx.fx = true;
        primary_part.bits.push(fx);

        let mut com = FixedFormat::new(1);
        com.bits.push(bits("STAT", 8, 1));
        let mut psr = FixedFormat::new(2);
        psr.bits.push(bits("RHO", 16, 1));

        CompoundFormat {
            primary: VariableFormat {
                parts: vec![primary_part],
            },
            parts: vec![
                DataItemFormat::Fixed(com),
                DataItemFormat::Fixed(psr),
            ],
        }
    }

    #[test]
    fn compound_decodes_present_subfields() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Compound(compound_two_subfields());

        // Mask 0xC0: both subfields present. 1 + 1 + 2 bytes total.
        let (fields, consumed) =
            decode_format(&format, &[0xC0, 0xAA, 0x12, 0x34], &ctx).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "COM");
        assert_eq!(fields[1].name, "PSR");
        let FieldKind::Group(sub) = &fields[1].kind else {
            panic!("expected group");
        };
        assert_eq!(leaf_unsigned(&sub[0]), 0x1234);
    }

    #[test]
    fn compound_skips_absent_subfields() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Compound(compound_two_subfields());

        // Mask 0x40: only the second subfield present.
        let (fields, consumed) = decode_format(&format, &[0x40, 0x12, 0x34], &ctx).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "PSR");
    }

    #[test]
    fn compound_set_bit_without_subfield_is_invalid() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Compound(compound_two_subfields());

        // Bit 5 of the mask set: no third subfield declared.
        let err = decode_format(&format, &[0x20, 0x00], &ctx).unwrap_err();
        assert!(matches!(err, AsterixError::Invalid(_)));
    }

    #[test]
    fn repetitive_decodes_count_items() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let mut sub = FixedFormat::new(2);
        sub.bits.push(bits("MB", 16, 1));
        let format = DataItemFormat::Repetitive(RepetitiveFormat {
            parts: vec![DataItemFormat::Fixed(sub)],
        });

        let (fields, consumed) =
            decode_format(&format, &[0x02, 0x00, 0x01, 0x00, 0x02], &ctx).unwrap();
        assert_eq!(consumed, 5);
        let FieldKind::List(reps) = &fields[0].kind else {
            panic!("expected list");
        };
        assert_eq!(reps.len(), 2);
        assert_eq!(leaf_unsigned(&reps[0][0]), 1);
        assert_eq!(leaf_unsigned(&reps[1][0]), 2);
    }

    #[test]
    fn repetitive_zero_count() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let mut sub = FixedFormat::new(2);
        sub.bits.push(bits("MB", 16, 1));
        let format = DataItemFormat::Repetitive(RepetitiveFormat {
            parts: vec![DataItemFormat::Fixed(sub)],
        });

        let (fields, consumed) = decode_format(&format, &[0x00], &ctx).unwrap();
        assert_eq!(consumed, 1);
        let FieldKind::List(reps) = &fields[0].kind else {
            panic!("expected list");
        };
        assert!(reps.is_empty());
    }

    #[test]
    fn repetitive_truncated_repetition() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let mut sub = FixedFormat::new(2);
        sub.bits.push(bits("MB", 16, 1));
        let format = DataItemFormat::Repetitive(RepetitiveFormat {
            parts: vec![DataItemFormat::Fixed(sub)],
        });

        let err = decode_format(&format, &[0x02, 0x00, 0x01, 0x00], &ctx).unwrap_err();
        assert!(matches!(err, AsterixError::Truncated { .. }));
    }

    #[test]
    fn explicit_without_inner_keeps_payload() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Explicit(ExplicitFormat::default());

        let (fields, consumed) = decode_format(&format, &[0x04, 0xDE, 0xAD, 0xBE], &ctx).unwrap();
        assert_eq!(consumed, 4);
        let FieldKind::Leaf(leaf) = &fields[0].kind else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.raw, RawValue::Bytes(vec![0xDE, 0xAD, 0xBE]));
    }

    #[test]
    fn explicit_inner_must_consume_payload() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let mut inner = FixedFormat::new(1);
        inner.bits.push(bits("V", 8, 1));
        let format = DataItemFormat::Explicit(ExplicitFormat {
            inner: Some(Box::new(DataItemFormat::Fixed(inner))),
        });

        // Payload is two bytes but the inner Fixed consumes one.
        let err = decode_format(&format, &[0x03, 0x01, 0x02], &ctx).unwrap_err();
        assert!(matches!(err, AsterixError::Invalid(_)));

        // Exact fit decodes.
        let (fields, consumed) = decode_format(&format, &[0x02, 0x7F], &ctx).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(leaf_unsigned(&fields[0]), 0x7F);
    }

    #[test]
    fn explicit_zero_length_is_invalid() {
        let registry = empty_registry();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Explicit(ExplicitFormat::default());
        let err = decode_format(&format, &[0x00], &ctx).unwrap_err();
        assert!(matches!(err, AsterixError::Invalid(_)));
    }

    fn registry_with_bds60() -> Registry {
        let mut fixed = FixedFormat::new(7);
        let mut hdg = bits("HDG", 56, 46);
        hdg.scale = Some(90.0 / 512.0);
        fixed.bits.push(hdg);

        let mut bds = Category::new(BDS_CATEGORY, "BDS registers", "1.0");
        bds.items.push(DataItemDescription {
            id: "60".into(),
            name: "Heading and speed report".into(),
            definition: String::new(),
            note: String::new(),
            rule: Rule::Optional,
            format: DataItemFormat::Fixed(fixed),
        });

        let mut registry = Registry::new();
        registry.insert(bds);
        registry
    }

    #[test]
    fn bds_resolves_register_schema() {
        let registry = registry_with_bds60();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Bds(BdsFormat);

        let data = [0x60, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let (fields, consumed) = decode_format(&format, &data, &ctx).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(fields[0].name, "BDS60");
        assert!(matches!(fields[0].kind, FieldKind::Group(_)));
    }

    #[test]
    fn bds_unknown_register_keeps_blob() {
        let registry = registry_with_bds60();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Bds(BdsFormat);

        let data = [0x44, 1, 2, 3, 4, 5, 6, 7];
        let (fields, consumed) = decode_format(&format, &data, &ctx).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(fields[0].name, "BDS44");
        let FieldKind::Leaf(leaf) = &fields[0].kind else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.raw, RawValue::Bytes(vec![1, 2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn bds_truncated() {
        let registry = registry_with_bds60();
        let ctx = DecodeContext {
            registry: &registry,
        };
        let format = DataItemFormat::Bds(BdsFormat);
        let err = decode_format(&format, &[0x60, 1, 2], &ctx).unwrap_err();
        assert!(matches!(err, AsterixError::Truncated { .. }));
    }

    #[test]
    fn width_hints() {
        let registry = registry_with_bds60();
        let ctx = DecodeContext {
            registry: &registry,
        };

        let fixed = DataItemFormat::Fixed(sac_sic());
        assert_eq!(width_hint(&fixed, &[], &ctx).unwrap(), 2);

        let var = DataItemFormat::Variable(two_part_variable());
        assert_eq!(width_hint(&var, &[0x54], &ctx).unwrap(), 1);
        assert_eq!(width_hint(&var, &[0x55, 0x54], &ctx).unwrap(), 2);

        let exp = DataItemFormat::Explicit(ExplicitFormat::default());
        assert_eq!(width_hint(&exp, &[0x05, 0, 0, 0, 0], &ctx).unwrap(), 5);

        let bds = DataItemFormat::Bds(BdsFormat);
        assert_eq!(width_hint(&bds, &[], &ctx).unwrap(), 8);

        let mut sub = FixedFormat::new(3);
        sub.bits.push(bits("X", 24, 1));
        let rep = DataItemFormat::Repetitive(RepetitiveFormat {
            parts: vec![DataItemFormat::Fixed(sub)],
        });
        assert_eq!(width_hint(&rep, &[0x02], &ctx).unwrap(), 7);
    }
}
