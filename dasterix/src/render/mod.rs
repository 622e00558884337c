//! Serializers for the parsed tree.
//!
//! Seven output formats share the same walk over blocks, records, items
//! and fields. Every serializer appends to the caller's buffer and never
//! clears it, so output from several parse runs can accumulate.

mod json;
mod line;
mod text;
mod xml;

use dasterix_core::tree::{Leaf, ParsedData, RawValue};
use dasterix_core::Registry;

use crate::filter::Filter;

/// Output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable text, one leaf per line.
    Text,
    /// One compact line per record.
    Line,
    /// Compact JSON, one object per data block per line.
    Json,
    /// Indented JSON.
    JsonPretty,
    /// Indented JSON plus raw values, hex and registry descriptions.
    JsonExtensive,
    /// Compact XML, one document fragment per data block per line.
    Xml,
    /// Indented XML.
    XmlPretty,
}

/// Renders `parsed` into `out`, honouring the filter.
pub fn render(
    registry: &Registry,
    filter: &Filter,
    parsed: &ParsedData,
    format: Format,
    out: &mut String,
) {
    match format {
        Format::Text => text::render(registry, filter, parsed, out),
        Format::Line => line::render(filter, parsed, out),
        Format::Json => json::render(registry, filter, parsed, json::Style::Compact, out),
        Format::JsonPretty => json::render(registry, filter, parsed, json::Style::Pretty, out),
        Format::JsonExtensive => {
            json::render(registry, filter, parsed, json::Style::Extensive, out)
        }
        Format::Xml => xml::render(filter, parsed, false, out),
        Format::XmlPretty => xml::render(filter, parsed, true, out),
    }
}

/// Display value of a leaf: the scaled value when a scale applies, the
/// raw value otherwise. Shared by the text and line formats.
fn leaf_value(leaf: &Leaf) -> String {
    if let Some(scaled) = leaf.scaled {
        return trim_float(scaled);
    }
    match &leaf.raw {
        RawValue::Unsigned(v) => v.to_string(),
        RawValue::Signed(v) => v.to_string(),
        RawValue::Octal(v) => format!("{v:o}"),
        RawValue::Text(s) => s.clone(),
        RawValue::Bytes(b) => format!("0x{}", hex::encode_upper(b)),
    }
}

/// Formats a scaled value without trailing zero noise.
fn trim_float(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_value_prefers_scaled() {
        let leaf = Leaf {
            raw: RawValue::Unsigned(128),
            scaled: Some(0.5),
            meaning: None,
            unit: "NM".into(),
        };
        assert_eq!(leaf_value(&leaf), "0.5");
    }

    #[test]
    fn leaf_value_raw_forms() {
        let unsigned = Leaf {
            raw: RawValue::Unsigned(35),
            scaled: None,
            meaning: None,
            unit: String::new(),
        };
        assert_eq!(leaf_value(&unsigned), "35");

        let octal = Leaf {
            raw: RawValue::Octal(0o7500),
            scaled: None,
            meaning: None,
            unit: String::new(),
        };
        assert_eq!(leaf_value(&octal), "7500");

        let bytes = Leaf {
            raw: RawValue::Bytes(vec![0xDE, 0xAD]),
            scaled: None,
            meaning: None,
            unit: String::new(),
        };
        assert_eq!(leaf_value(&bytes), "0xDEAD");
    }

    #[test]
    fn float_trimming() {
        assert_eq!(trim_float(275.0), "275");
        assert_eq!(trim_float(0.25), "0.25");
        assert_eq!(trim_float(-12.5), "-12.5");
    }
}
