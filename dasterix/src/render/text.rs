//! Human-readable text output.

use std::fmt::Write;

use dasterix_core::Registry;
use dasterix_core::tree::{Field, FieldKind, ParsedData, Record};

use crate::filter::Filter;

use super::leaf_value;

pub(super) fn render(
    registry: &Registry,
    filter: &Filter,
    parsed: &ParsedData,
    out: &mut String,
) {
    for block in &parsed.blocks {
        let category_name = registry
            .describe(block.category as u16, None, None, None)
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "ASTERIX CAT{:03} {} len={} ts={} ok={}",
            block.category, category_name, block.length, block.timestamp_ms, block.format_ok
        );

        for (nr, record) in block.records.iter().enumerate() {
            render_record(block.category as u16, filter, nr + 1, record, out);
        }
    }
}

fn render_record(category: u16, filter: &Filter, nr: usize, record: &Record, out: &mut String) {
    let _ = writeln!(
        out,
        "  Record {nr} len={} crc={:08X} ok={}",
        record.length, record.crc, record.format_ok
    );

    for item in &record.items {
        if filter.is_filtered(category, &item.id, None) {
            continue;
        }
        let _ = writeln!(out, "    Item {} : {}", item.id, item.name);
        for field in &item.fields {
            render_field(category, filter, &item.id, field, 6, out);
        }
    }
}

fn render_field(
    category: u16,
    filter: &Filter,
    item_id: &str,
    field: &Field,
    indent: usize,
    out: &mut String,
) {
    if !field.name.is_empty() && filter.is_filtered(category, item_id, Some(&field.name)) {
        return;
    }

    match &field.kind {
        FieldKind::Leaf(leaf) => {
            let _ = write!(out, "{:indent$}{} = {}", "", field.name, leaf_value(leaf));
            if !leaf.unit.is_empty() {
                let _ = write!(out, " [{}]", leaf.unit);
            }
            if let Some(meaning) = &leaf.meaning {
                let _ = write!(out, " ({meaning})");
            }
            out.push('\n');
        }
        FieldKind::Group(children) => {
            let _ = writeln!(out, "{:indent$}{}:", "", field.name);
            for child in children {
                render_field(category, filter, item_id, child, indent + 2, out);
            }
        }
        FieldKind::List(repetitions) => {
            for (i, repetition) in repetitions.iter().enumerate() {
                let _ = writeln!(out, "{:indent$}[{}]:", "", i + 1);
                for child in repetition {
                    render_field(category, filter, item_id, child, indent + 2, out);
                }
            }
        }
    }
}
