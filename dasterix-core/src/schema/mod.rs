//! In-memory representation of a category grammar.
//!
//! A [`Category`] is built once (by the XML loader or, in tests, by hand)
//! and is read-only afterwards. It owns its data items and UAPs; data
//! items own their format trees.

mod bits;
mod format;
mod uap;

pub use bits::{Bits, BitsValue, Encoding};
pub use format::{
    BDS_ITEM_LEN, BdsFormat, CompoundFormat, DataItemFormat, ExplicitFormat, FixedFormat,
    RepetitiveFormat, VariableFormat,
};
pub use uap::{Uap, UapEntry, UapSelector, UapSlot};

/// Presence rule of a data item within its category.
///
/// The grammars carry `conditional` on some items without machine-readable
/// conditions; those decode exactly like optional items and the tag is
/// kept for callers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule {
    #[default]
    Optional,
    Mandatory,
    Conditional,
}

impl Rule {
    pub fn parse(value: &str) -> Self {
        match value {
            "mandatory" => Rule::Mandatory,
            "conditional" => Rule::Conditional,
            _ => Rule::Optional,
        }
    }
}

/// Description of one data item: identity, human-readable metadata, and
/// the root format tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItemDescription {
    /// Item id as printed in the specifications, e.g. `"010"`.
    pub id: String,
    pub name: String,
    pub definition: String,
    pub note: String,
    pub rule: Rule,
    pub format: DataItemFormat,
}

/// One loaded category grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Category number, 1..=255; 256 is the internal BDS pseudo-category.
    pub id: u16,
    pub name: String,
    pub version: String,
    pub items: Vec<DataItemDescription>,
    pub uaps: Vec<Uap>,
}

impl Category {
    pub fn new(id: u16, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            version: version.into(),
            items: Vec::new(),
            uaps: Vec::new(),
        }
    }

    /// Looks up a data item by id. A leading `I` is tolerated, so both
    /// `"010"` and `"I010"` resolve.
    pub fn item(&self, id: &str) -> Option<&DataItemDescription> {
        let id = id.strip_prefix('I').unwrap_or(id);
        self.items.iter().find(|item| item.id == id)
    }

    /// Selects the UAP for a record body (FSPEC included), trying the
    /// declared UAPs in order and returning the first match.
    ///
    /// Both conditional selectors address the bytes *after* the FSPEC:
    /// the match position is found by skipping octets while their FX bit
    /// is set, then indexing from the first post-FSPEC octet.
    pub fn select_uap(&self, record: &[u8]) -> Option<&Uap> {
        self.uaps.iter().find(|uap| match uap.selector {
            UapSelector::Unconditional => true,
            UapSelector::BitSet(bit) => {
                let Some(body) = skip_fspec(record) else {
                    return false;
                };
                let byte = (bit as usize - 1) / 8;
                let mask = 0x80u8 >> ((bit as usize - 1) % 8);
                body.get(byte).is_some_and(|b| b & mask != 0)
            }
            UapSelector::ByteEquals { byte_nr, value } => {
                let Some(body) = skip_fspec(record) else {
                    return false;
                };
                body.get(byte_nr as usize - 1) == Some(&value)
            }
        })
    }

    /// Layered description walk: with `field` and `value`, the value's
    /// enumerated meaning; with `field` only, the field's long name; with
    /// neither, the item's name. `None` at any unresolved step.
    pub fn description(
        &self,
        item: &str,
        field: Option<&str>,
        value: Option<i64>,
    ) -> Option<String> {
        let item = self.item(item)?;
        let Some(field) = field else {
            return Some(item.name.clone());
        };
        let bits = item.format.find_field(field)?;
        match value {
            None => Some(bits.name.clone()),
            Some(v) => bits.meaning_of(v).map(str::to_owned),
        }
    }
}

/// Returns the record bytes following the FSPEC, or `None` when the FSPEC
/// never terminates within `record`.
fn skip_fspec(record: &[u8]) -> Option<&[u8]> {
    let mut pos = 0;
    while record.get(pos)? & 0x01 != 0 {
        pos += 1;
    }
    Some(&record[pos + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_octet_fixed(fields: &[(&str, &str, usize, usize)]) -> DataItemFormat {
        let mut fixed = FixedFormat::new(2);
        for &(short, long, from, to) in fields {
            let mut bits = Bits::new(from, to);
            bits.short_name = short.into();
            bits.name = long.into();
            fixed.bits.push(bits);
        }
        DataItemFormat::Fixed(fixed)
    }

    fn category_with_sac_sic() -> Category {
        let mut cat = Category::new(48, "Monoradar Target Reports", "1.30");
        cat.items.push(DataItemDescription {
            id: "010".into(),
            name: "Data Source Identifier".into(),
            definition: "Identification of the radar station".into(),
            note: String::new(),
            rule: Rule::Mandatory,
            format: two_octet_fixed(&[
                ("SAC", "System Area Code", 16, 9),
                ("SIC", "System Identification Code", 8, 1),
            ]),
        });
        cat
    }

    #[test]
    fn item_lookup_tolerates_prefix() {
        let cat = category_with_sac_sic();
        assert!(cat.item("010").is_some());
        assert!(cat.item("I010").is_some());
        assert!(cat.item("020").is_none());
    }

    #[test]
    fn description_walk() {
        let cat = category_with_sac_sic();
        assert_eq!(
            cat.description("010", None, None).as_deref(),
            Some("Data Source Identifier")
        );
        assert_eq!(
            cat.description("I010", Some("SAC"), None).as_deref(),
            Some("System Area Code")
        );
        // No enumeration declared: the value step resolves to nothing.
        assert_eq!(cat.description("010", Some("SAC"), Some(1)), None);
        assert_eq!(cat.description("010", Some("XYZ"), None), None);
    }

    #[test]
    fn uap_selection_first_match_wins() {
        let mut cat = category_with_sac_sic();
        cat.uaps.push(Uap::new(UapSelector::BitSet(1)));
        cat.uaps.push(Uap::new(UapSelector::Unconditional));

        // FSPEC 0x80 (one octet), body starts 0x80: bit 1 of the body set.
        let record = [0x80u8, 0x80, 0x00];
        let selected = cat.select_uap(&record).unwrap();
        assert_eq!(selected.selector, UapSelector::BitSet(1));

        // Body bit 1 clear: falls through to the unconditional UAP.
        let record = [0x80u8, 0x00, 0x00];
        let selected = cat.select_uap(&record).unwrap();
        assert_eq!(selected.selector, UapSelector::Unconditional);
    }

    #[test]
    fn uap_selection_byte_match_skips_fspec() {
        let mut cat = category_with_sac_sic();
        cat.uaps.push(Uap::new(UapSelector::ByteEquals {
            byte_nr: 2,
            value: 0xAB,
        }));
        cat.uaps.push(Uap::new(UapSelector::Unconditional));

        // Two FSPEC octets (0x01 chains), then body 0x00 0xAB.
        let record = [0x01u8, 0x80, 0x00, 0xAB];
        let selected = cat.select_uap(&record).unwrap();
        assert!(matches!(selected.selector, UapSelector::ByteEquals { .. }));
    }

    #[test]
    fn uap_selection_on_unterminated_fspec() {
        let mut cat = category_with_sac_sic();
        cat.uaps.push(Uap::new(UapSelector::BitSet(1)));
        // Conditional selector cannot match, and there is no fallback.
        let record = [0x01u8, 0x01, 0x01];
        assert!(cat.select_uap(&record).is_none());
    }
}
