//! The six ASTERIX data-item layout variants.
//!
//! Every data item declares exactly one root format. Formats nest
//! (Compound subfields, Explicit payloads, Repetitive sub-parts), so the
//! variants form a closed tree with each node owning its children.

use super::bits::Bits;

/// Structural layout of a data item, as declared by the category grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum DataItemFormat {
    Fixed(FixedFormat),
    Variable(VariableFormat),
    Compound(CompoundFormat),
    Repetitive(RepetitiveFormat),
    Explicit(ExplicitFormat),
    Bds(BdsFormat),
}

impl DataItemFormat {
    /// Grammar element name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DataItemFormat::Fixed(_) => "Fixed",
            DataItemFormat::Variable(_) => "Variable",
            DataItemFormat::Compound(_) => "Compound",
            DataItemFormat::Repetitive(_) => "Repetitive",
            DataItemFormat::Explicit(_) => "Explicit",
            DataItemFormat::Bds(_) => "BDS",
        }
    }

    /// Finds the bit-field descriptor with the given short name anywhere
    /// in this format tree (used by the registry description walk).
    pub fn find_field(&self, short_name: &str) -> Option<&Bits> {
        match self {
            DataItemFormat::Fixed(fixed) => {
                fixed.bits.iter().find(|b| b.short_name == short_name)
            }
            DataItemFormat::Variable(var) => var
                .parts
                .iter()
                .find_map(|p| p.bits.iter().find(|b| b.short_name == short_name)),
            DataItemFormat::Compound(comp) => comp
                .primary
                .parts
                .iter()
                .find_map(|p| p.bits.iter().find(|b| b.short_name == short_name))
                .or_else(|| comp.parts.iter().find_map(|p| p.find_field(short_name))),
            DataItemFormat::Repetitive(rep) => {
                rep.parts.iter().find_map(|p| p.find_field(short_name))
            }
            DataItemFormat::Explicit(exp) => {
                exp.inner.as_deref().and_then(|f| f.find_field(short_name))
            }
            DataItemFormat::Bds(_) => None,
        }
    }
}

/// Fixed-length block: `length` octets described by an ordered list of
/// bit fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFormat {
    pub length: usize,
    pub bits: Vec<Bits>,
}

impl FixedFormat {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            bits: Vec::new(),
        }
    }
}

/// Variable-length item: a sequence of Fixed parts chained by FX bits.
/// Parts are consumed while the extension bit (LSB) of the consumed part
/// is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableFormat {
    pub parts: Vec<FixedFormat>,
}

/// Compound item: a Variable primary subfield whose data bits form a
/// presence mask over `parts`, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundFormat {
    pub primary: VariableFormat,
    pub parts: Vec<DataItemFormat>,
}

/// Repetitive item: a one-octet repetition count followed by that many
/// back-to-back repetitions of the sub-parts (Fixed or BDS).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepetitiveFormat {
    pub parts: Vec<DataItemFormat>,
}

/// Explicit item: a one-octet length (which counts itself) followed by
/// the payload. Without an inner format the payload stays opaque.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExplicitFormat {
    pub inner: Option<Box<DataItemFormat>>,
}

/// Mode-S Comm-B Data Selector item: one register octet plus seven data
/// octets decoded by the register's schema from the BDS category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BdsFormat;

/// Wire size of a BDS item: register octet + 7 data octets.
pub const BDS_ITEM_LEN: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_grammar_elements() {
        assert_eq!(DataItemFormat::Fixed(FixedFormat::new(2)).kind(), "Fixed");
        assert_eq!(
            DataItemFormat::Variable(VariableFormat::default()).kind(),
            "Variable"
        );
        assert_eq!(
            DataItemFormat::Explicit(ExplicitFormat::default()).kind(),
            "Explicit"
        );
        assert_eq!(DataItemFormat::Bds(BdsFormat).kind(), "BDS");
    }
}
