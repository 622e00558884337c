//! One-line-per-record output, meant for downstream line-oriented
//! consumers: `CAT%03d/I%s/%s=value` tokens joined by `;`.

use std::fmt::Write;

use dasterix_core::tree::{Field, FieldKind, ParsedData};

use crate::filter::Filter;

use super::leaf_value;

pub(super) fn render(filter: &Filter, parsed: &ParsedData, out: &mut String) {
    for block in &parsed.blocks {
        for record in &block.records {
            let mut tokens = Vec::new();
            for item in &record.items {
                if filter.is_filtered(block.category as u16, &item.id, None) {
                    continue;
                }
                for field in &item.fields {
                    collect_tokens(
                        filter,
                        block.category as u16,
                        &item.id,
                        field,
                        &mut String::new(),
                        &mut tokens,
                    );
                }
            }
            // An empty line still marks the record when everything in it
            // was filtered away.
            let _ = writeln!(out, "{}", tokens.join(";"));
        }
    }
}

fn collect_tokens(
    filter: &Filter,
    category: u16,
    item_id: &str,
    field: &Field,
    prefix: &mut String,
    tokens: &mut Vec<String>,
) {
    if !field.name.is_empty() && filter.is_filtered(category, item_id, Some(&field.name)) {
        return;
    }

    match &field.kind {
        FieldKind::Leaf(leaf) => {
            tokens.push(format!(
                "CAT{category:03}/I{item_id}/{prefix}{}={}",
                field.name,
                leaf_value(leaf)
            ));
        }
        FieldKind::Group(children) => {
            let saved = prefix.len();
            prefix.push_str(&field.name);
            prefix.push('.');
            for child in children {
                collect_tokens(filter, category, item_id, child, prefix, tokens);
            }
            prefix.truncate(saved);
        }
        FieldKind::List(repetitions) => {
            for (i, repetition) in repetitions.iter().enumerate() {
                let saved = prefix.len();
                let _ = write!(prefix, "[{}].", i + 1);
                for child in repetition {
                    collect_tokens(filter, category, item_id, child, prefix, tokens);
                }
                prefix.truncate(saved);
            }
        }
    }
}
