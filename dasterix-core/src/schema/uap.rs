//! User Application Profiles: the mapping from FSPEC bits to data items.

/// Condition under which a UAP applies to a record. A category may carry
/// several UAPs; they are tried in declaration order and the first match
/// wins, with at most one unconditional fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UapSelector {
    /// Applies to every record (the usual single-UAP case).
    Unconditional,
    /// Applies when the given 1-based bit of the record body (the bytes
    /// following the FSPEC) is set.
    BitSet(u32),
    /// Applies when the given 1-based octet of the record body equals
    /// `value`.
    ByteEquals { byte_nr: u32, value: u8 },
}

/// What a UAP entry points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UapSlot {
    /// A data item, by id (e.g. `"010"`).
    Item(String),
    /// A reserved FRN that consumes nothing.
    Spare,
    /// The FSPEC extension bit position itself.
    Fx,
}

/// One UAP row: FSPEC bit position, target slot, and the grammar's
/// optional item length hint (`len` attribute, informational only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UapEntry {
    /// 0-based bit index across the whole FSPEC, FX positions included.
    pub bit: u32,
    pub slot: UapSlot,
    pub length_hint: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uap {
    pub selector: UapSelector,
    pub entries: Vec<UapEntry>,
}

impl Uap {
    pub fn new(selector: UapSelector) -> Self {
        Self {
            selector,
            entries: Vec::new(),
        }
    }

    /// Number of data FRNs (FX rows excluded).
    pub fn frn_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.slot != UapSlot::Fx)
            .count()
    }

    /// Longest FSPEC this UAP can address: seven FRNs per octet.
    pub fn max_fspec_bytes(&self) -> usize {
        self.frn_count().div_ceil(7).max(1)
    }

    /// Entry for a 1-based FRN, counting declaration order and skipping
    /// FX rows.
    pub fn entry(&self, frn: usize) -> Option<&UapEntry> {
        self.entries
            .iter()
            .filter(|e| e.slot != UapSlot::Fx)
            .nth(frn.checked_sub(1)?)
    }
}
