//! XML output. Elements are named after items (`I048` style ids become
//! `I010`, `I040`, ...) and field short names; values travel as
//! attributes. The compact variant emits one block fragment per line.

use std::fmt::Write;

use quick_xml::escape::escape;

use dasterix_core::tree::{Field, FieldKind, Leaf, ParsedData, RawValue, Record};

use crate::filter::Filter;

use super::trim_float;

pub(super) fn render(filter: &Filter, parsed: &ParsedData, pretty: bool, out: &mut String) {
    for block in &parsed.blocks {
        let mut xml = XmlOut::new(pretty);
        xml.open(
            "DataBlock",
            &[
                ("category", block.category.to_string()),
                ("length", block.length.to_string()),
                ("timestamp_ms", block.timestamp_ms.to_string()),
                ("ok", bool_attr(block.format_ok)),
            ],
        );
        for (nr, record) in block.records.iter().enumerate() {
            render_record(filter, block.category as u16, nr + 1, record, &mut xml);
        }
        xml.close("DataBlock");
        out.push_str(&xml.buffer);
        out.push('\n');
    }
}

fn render_record(filter: &Filter, category: u16, nr: usize, record: &Record, xml: &mut XmlOut) {
    xml.open(
        "Record",
        &[
            ("nr", nr.to_string()),
            ("len", record.length.to_string()),
            ("crc", format!("{:08X}", record.crc)),
            ("ok", bool_attr(record.format_ok)),
        ],
    );

    for item in &record.items {
        if filter.is_filtered(category, &item.id, None) {
            continue;
        }
        xml.open(&format!("I{}", item.id), &[]);
        for field in &item.fields {
            render_field(filter, category, &item.id, field, xml);
        }
        xml.close(&format!("I{}", item.id));
    }

    xml.close("Record");
}

fn render_field(filter: &Filter, category: u16, item_id: &str, field: &Field, xml: &mut XmlOut) {
    if !field.name.is_empty() && filter.is_filtered(category, item_id, Some(&field.name)) {
        return;
    }

    match &field.kind {
        FieldKind::Leaf(leaf) => {
            xml.empty(&field.name, &leaf_attrs(leaf));
        }
        FieldKind::Group(children) => {
            xml.open(&field.name, &[]);
            for child in children {
                render_field(filter, category, item_id, child, xml);
            }
            xml.close(&field.name);
        }
        FieldKind::List(repetitions) => {
            for (i, repetition) in repetitions.iter().enumerate() {
                xml.open("rep", &[("nr", (i + 1).to_string())]);
                for child in repetition {
                    render_field(filter, category, item_id, child, xml);
                }
                xml.close("rep");
            }
        }
    }
}

fn leaf_attrs(leaf: &Leaf) -> Vec<(&'static str, String)> {
    let mut attrs = Vec::new();
    let raw = match &leaf.raw {
        RawValue::Unsigned(v) => v.to_string(),
        RawValue::Signed(v) => v.to_string(),
        RawValue::Octal(v) => format!("{v:o}"),
        RawValue::Text(s) => s.clone(),
        RawValue::Bytes(b) => hex::encode_upper(b),
    };
    attrs.push(("raw", raw));
    if let Some(scaled) = leaf.scaled {
        attrs.push(("val", trim_float(scaled)));
    }
    if let Some(meaning) = &leaf.meaning {
        attrs.push(("meaning", meaning.clone()));
    }
    if !leaf.unit.is_empty() {
        attrs.push(("unit", leaf.unit.clone()));
    }
    attrs
}

fn bool_attr(value: bool) -> String {
    if value { "1".into() } else { "0".into() }
}

/// Minimal element writer. The structure of the output is fixed and
/// attribute values pass through quick-xml escaping.
struct XmlOut {
    buffer: String,
    pretty: bool,
    depth: usize,
}

impl XmlOut {
    fn new(pretty: bool) -> Self {
        Self {
            buffer: String::new(),
            pretty,
            depth: 0,
        }
    }

    fn indent(&mut self) {
        if self.pretty {
            if !self.buffer.is_empty() {
                self.buffer.push('\n');
            }
            for _ in 0..self.depth {
                self.buffer.push_str("  ");
            }
        }
    }

    fn write_attrs(&mut self, attrs: &[(&str, String)]) {
        for (key, value) in attrs {
            let _ = write!(self.buffer, " {key}=\"{}\"", escape(value));
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.indent();
        let _ = write!(self.buffer, "<{name}");
        self.write_attrs(attrs);
        self.buffer.push('>');
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth -= 1;
        self.indent();
        let _ = write!(self.buffer, "</{name}>");
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.indent();
        let _ = write!(self.buffer, "<{name}");
        self.write_attrs(attrs);
        self.buffer.push_str("/>");
    }
}
