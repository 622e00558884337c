//! JSON output: compact (one block per line), pretty, and extensive
//! (raw values, record hex and registry descriptions included).

use serde_json::{Map, Number, Value, json};

use dasterix_core::Registry;
use dasterix_core::tree::{DataBlock, Field, FieldKind, Leaf, RawValue, Record};

use crate::filter::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Style {
    Compact,
    Pretty,
    Extensive,
}

pub(super) fn render(
    registry: &Registry,
    filter: &Filter,
    parsed: &dasterix_core::tree::ParsedData,
    style: Style,
    out: &mut String,
) {
    for block in &parsed.blocks {
        let value = block_value(registry, filter, block, style);
        let rendered = match style {
            Style::Compact => serde_json::to_string(&value),
            Style::Pretty | Style::Extensive => serde_json::to_string_pretty(&value),
        };
        if let Ok(rendered) = rendered {
            out.push_str(&rendered);
            out.push('\n');
        }
    }
}

fn block_value(registry: &Registry, filter: &Filter, block: &DataBlock, style: Style) -> Value {
    let records: Vec<Value> = block
        .records
        .iter()
        .map(|r| record_value(registry, filter, block.category as u16, r, style))
        .collect();

    json!({
        "category": block.category,
        "length": block.length,
        "timestamp_ms": block.timestamp_ms,
        "format_ok": block.format_ok,
        "records": records,
    })
}

fn record_value(
    registry: &Registry,
    filter: &Filter,
    category: u16,
    record: &Record,
    style: Style,
) -> Value {
    let mut map = Map::new();

    if style == Style::Extensive {
        map.insert("crc".into(), Value::String(format!("{:08X}", record.crc)));
        map.insert("hex".into(), Value::String(record.hex.clone()));
        map.insert("format_ok".into(), Value::Bool(record.format_ok));
    }

    for item in &record.items {
        if filter.is_filtered(category, &item.id, None) {
            continue;
        }
        let mut fields = Map::new();
        if style == Style::Extensive {
            if let Some(desc) = registry.describe(category, Some(&item.id), None, None) {
                fields.insert("desc".into(), Value::String(desc));
            }
        }
        for field in &item.fields {
            insert_field(registry, filter, category, &item.id, field, style, &mut fields);
        }
        map.insert(format!("I{}", item.id), Value::Object(fields));
    }

    Value::Object(map)
}

fn insert_field(
    registry: &Registry,
    filter: &Filter,
    category: u16,
    item_id: &str,
    field: &Field,
    style: Style,
    target: &mut Map<String, Value>,
) {
    if !field.name.is_empty() && filter.is_filtered(category, item_id, Some(&field.name)) {
        return;
    }

    match &field.kind {
        FieldKind::Leaf(leaf) => {
            target.insert(
                field.name.clone(),
                leaf_value(registry, category, item_id, &field.name, leaf, style),
            );
        }
        FieldKind::Group(children) => {
            let mut sub = Map::new();
            for child in children {
                insert_field(registry, filter, category, item_id, child, style, &mut sub);
            }
            target.insert(field.name.clone(), Value::Object(sub));
        }
        FieldKind::List(repetitions) => {
            let reps: Vec<Value> = repetitions
                .iter()
                .map(|repetition| {
                    let mut sub = Map::new();
                    for child in repetition {
                        insert_field(registry, filter, category, item_id, child, style, &mut sub);
                    }
                    Value::Object(sub)
                })
                .collect();
            let name = if field.name.is_empty() {
                "rep".to_string()
            } else {
                field.name.clone()
            };
            target.insert(name, Value::Array(reps));
        }
    }
}

fn leaf_value(
    registry: &Registry,
    category: u16,
    item_id: &str,
    name: &str,
    leaf: &Leaf,
    style: Style,
) -> Value {
    if style != Style::Extensive {
        return plain_value(leaf);
    }

    let mut map = Map::new();
    map.insert("raw".into(), raw_value(&leaf.raw));
    if let Some(scaled) = leaf.scaled {
        if let Some(n) = Number::from_f64(scaled) {
            map.insert("val".into(), Value::Number(n));
        }
    }
    if let Some(meaning) = &leaf.meaning {
        map.insert("meaning".into(), Value::String(meaning.clone()));
    }
    if let Some(desc) = registry.describe(category, Some(item_id), Some(name), None) {
        map.insert("desc".into(), Value::String(desc));
    }
    if !leaf.unit.is_empty() {
        map.insert("unit".into(), Value::String(leaf.unit.clone()));
    }
    Value::Object(map)
}

/// Compact leaf value: the scaled number when a scale applies, otherwise
/// the raw value in its natural JSON shape.
fn plain_value(leaf: &Leaf) -> Value {
    if let Some(scaled) = leaf.scaled {
        if let Some(n) = Number::from_f64(scaled) {
            return Value::Number(n);
        }
    }
    raw_value(&leaf.raw)
}

fn raw_value(raw: &RawValue) -> Value {
    match raw {
        RawValue::Unsigned(v) => Value::Number((*v).into()),
        RawValue::Signed(v) => Value::Number((*v).into()),
        RawValue::Octal(v) => Value::String(format!("{v:o}")),
        RawValue::Text(s) => Value::String(s.clone()),
        RawValue::Bytes(b) => Value::String(hex::encode_upper(b)),
    }
}
