//! # dasterix
//!
//! Data-driven ASTERIX decoding library.
//!
//! Category grammars are loaded from XML definition files at startup and
//! interpreted against binary packets; the parsed tree can be rendered
//! as text, JSON or XML, or consumed directly.
//!
//! ```no_run
//! use dasterix::{Asterix, Format};
//!
//! let decoder = Asterix::init("config/definitions.ini")?;
//! let parsed = decoder.parse(&[0x30, 0x00, 0x06, 0x80, 0x01, 0x23], 0);
//!
//! let mut out = String::new();
//! decoder.render(&parsed, Format::Json, &mut out);
//! println!("{out}");
//! # Ok::<(), dasterix::AsterixError>(())
//! ```
//!
//! The [`Asterix`] handle is built once, is immutable afterwards, and can
//! be shared behind `&` across threads for concurrent decoding.

mod filter;
mod render;

use std::path::Path;

use dasterix_core::decode;

pub use dasterix_core::error::AsterixError;
pub use dasterix_core::schema;
pub use dasterix_core::tree::{
    DataBlock, Field, FieldKind, Item, Leaf, ParsedData, RawValue, Record,
};
pub use dasterix_core::{BDS_CATEGORY, Registry};
pub use dasterix_xml::{LoadStats, load_category_file, parse_category};
pub use filter::Filter;
pub use render::{Format, render as render_with};

/// A loaded decoder: the definition registry plus the output filter.
///
/// Built from a definitions manifest (or category files loaded one by
/// one), then used read-only. Loading works through `&mut self`, so a
/// shared handle cannot be mutated.
pub struct Asterix {
    registry: Registry,
    filter: Filter,
}

impl Asterix {
    /// Creates an empty decoder with no categories loaded.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            filter: Filter::new(),
        }
    }

    /// Loads every grammar file listed in the definitions manifest.
    ///
    /// Files that fail to parse are logged and skipped; the decoder still
    /// initializes with the categories that loaded. Only manifest-level
    /// problems fail the call.
    pub fn init(manifest_path: impl AsRef<Path>) -> Result<Self, AsterixError> {
        let mut decoder = Self::new();
        let stats = dasterix_xml::load_manifest(manifest_path.as_ref(), &mut decoder.registry)?;
        log::info!(
            "definitions loaded: {} categories, {} files failed",
            stats.loaded,
            stats.failed
        );
        Ok(decoder)
    }

    /// Loads a single category definition file into the registry.
    pub fn load_category(&mut self, xml_path: impl AsRef<Path>) -> Result<(), AsterixError> {
        let category = dasterix_xml::load_category_file(xml_path.as_ref())?;
        self.registry.insert(category);
        Ok(())
    }

    /// Whether a wire category (1..=255) has a loaded definition. The
    /// internal BDS slot is not addressable here.
    pub fn is_category_defined(&self, category: u16) -> bool {
        (1..=255).contains(&category) && self.registry.is_defined(category)
    }

    /// Read access to the definition registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parses every data block in `bytes`.
    pub fn parse(&self, bytes: &[u8], timestamp_ms: u64) -> ParsedData {
        decode::parse(&self.registry, bytes, timestamp_ms)
    }

    /// Parses one data block at `cursor`; see
    /// [`decode::parse_next_block`].
    pub fn parse_next_block(
        &self,
        bytes: &[u8],
        cursor: usize,
        timestamp_ms: u64,
    ) -> Result<(Option<DataBlock>, usize), AsterixError> {
        decode::parse_next_block(&self.registry, bytes, cursor, timestamp_ms)
    }

    /// Parses up to `max_blocks` blocks starting at `offset` (`0` = all);
    /// returns the parsed data, the bytes consumed and an estimate of the
    /// blocks remaining.
    pub fn parse_with_offset(
        &self,
        bytes: &[u8],
        offset: usize,
        max_blocks: usize,
        timestamp_ms: u64,
    ) -> Result<(ParsedData, usize, usize), AsterixError> {
        decode::parse_with_offset(&self.registry, bytes, offset, max_blocks, timestamp_ms)
    }

    /// Layered description lookup; see [`Registry::describe`].
    pub fn describe(
        &self,
        category: u16,
        item: Option<&str>,
        field: Option<&str>,
        value: Option<i64>,
    ) -> Option<String> {
        self.registry.describe(category, item, field, value)
    }

    /// One line per known bit field of the loaded definitions.
    pub fn descriptors(&self) -> String {
        self.registry.descriptors()
    }

    /// Renders `parsed` into `out`, appending and honouring the filter.
    pub fn render(&self, parsed: &ParsedData, format: Format, out: &mut String) {
        render::render(&self.registry, &self.filter, parsed, format, out);
    }

    /// Suppresses an item (or one field of it) in rendered output.
    pub fn set_filter(&mut self, category: u16, item: &str, field: Option<&str>) {
        self.filter.set(category, item, field);
    }

    /// Whether the given item or field is currently filtered.
    pub fn is_filtered(&self, category: u16, item: &str, field: Option<&str>) -> bool {
        self.filter.is_filtered(category, item, field)
    }

    /// Removes all filter entries.
    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }
}

impl Default for Asterix {
    fn default() -> Self {
        Self::new()
    }
}
