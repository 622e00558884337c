//! Parsed output model: the tree a decode run produces.
//!
//! Ownership follows the wire nesting: [`ParsedData`] owns its blocks,
//! a [`DataBlock`] owns its records, a [`Record`] its items, an [`Item`]
//! its field tree. Everything is plain data; serializers only read it.

/// Result of parsing one buffer: the data blocks in input byte order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedData {
    pub blocks: Vec<DataBlock>,
}

impl ParsedData {
    /// Total number of records across all blocks.
    pub fn record_count(&self) -> usize {
        self.blocks.iter().map(|b| b.records.len()).sum()
    }
}

/// One `category | length | payload` block.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub category: u8,
    /// Payload length in bytes (the wire length field minus the 3-octet
    /// header).
    pub length: usize,
    /// Caller-supplied capture time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// False when the block header was consistent but its records were
    /// not fully decoded.
    pub format_ok: bool,
    pub records: Vec<Record>,
}

/// One FSPEC-prefixed record within a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub category: u8,
    pub timestamp_ms: u64,
    /// Record length in bytes, FSPEC included.
    pub length: usize,
    /// CRC-32 over the record bytes.
    pub crc: u32,
    /// Upper-case hex dump of the record bytes.
    pub hex: String,
    /// False when decoding stopped mid-record; the items decoded up to
    /// that point are kept.
    pub format_ok: bool,
    pub items: Vec<Item>,
}

/// One decoded data item.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Item id within the category, e.g. `"010"`.
    pub id: String,
    /// Item name from the grammar (empty when the grammar omits it).
    pub name: String,
    pub fields: Vec<Field>,
}

/// A node of an item's field tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field short name (or subfield/register label for groups).
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A decoded bit field.
    Leaf(Leaf),
    /// A named subtree: compound subfield or BDS register contents.
    Group(Vec<Field>),
    /// Repetitive contents: one field list per repetition, in wire order.
    List(Vec<Vec<Field>>),
}

/// Decoded value of a leaf field.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub raw: RawValue,
    /// `raw * scale` when the grammar declares a scale.
    pub scaled: Option<f64>,
    /// Enumerated meaning of the raw value, when declared.
    pub meaning: Option<String>,
    /// Unit string from the grammar (empty when none).
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Unsigned(u64),
    Signed(i64),
    /// Unsigned value conventionally printed in octal (squawk codes).
    Octal(u64),
    /// Six-bit character fields.
    Text(String),
    /// Hex-encoded fields and opaque payloads.
    Bytes(Vec<u8>),
}

impl RawValue {
    /// Integer view of the raw value, when it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Unsigned(v) | RawValue::Octal(v) => i64::try_from(*v).ok(),
            RawValue::Signed(v) => Some(*v),
            _ => None,
        }
    }
}

impl Field {
    pub fn leaf(name: impl Into<String>, leaf: Leaf) -> Self {
        Field {
            name: name.into(),
            kind: FieldKind::Leaf(leaf),
        }
    }

    pub fn group(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Field {
            name: name.into(),
            kind: FieldKind::Group(fields),
        }
    }
}
