//! # dasterix-core
//!
//! Core runtime library for data-driven ASTERIX message decoding.
//!
//! The crate holds everything needed to decode binary ASTERIX once the
//! category grammars are in memory; it knows nothing about XML or I/O.
//! Schemas are plain data and can be built by any producer (the
//! `dasterix-xml` loader in production, test code by hand).
//!
//! ## Key components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bit_reader`] | Extract unsigned/signed/six-bit-char/flag values from byte slices |
//! | [`fspec`] | Field Specification bitmap: bounded read, FRN iteration |
//! | [`schema`] | Category grammars: data items, the six format variants, UAPs |
//! | [`registry`] | Category number to grammar, plus the description walk |
//! | [`decode`] | Format interpreters, record decoder, packet parser |
//! | [`tree`] | Parsed output: blocks, records, items, field trees |
//! | [`error`] | [`AsterixError`], the unified error taxonomy |
//!
//! ## Decoding
//!
//! ```
//! use dasterix_core::decode;
//! use dasterix_core::registry::Registry;
//!
//! let registry = Registry::new(); // normally populated by the XML loader
//! let parsed = decode::parse(&registry, &[], 0);
//! assert!(parsed.blocks.is_empty());
//! ```
//!
//! The registry is written only during initialization; afterwards a
//! `&Registry` can be shared across threads for concurrent decoding.

pub mod bit_reader;
pub mod decode;
pub mod error;
pub mod fspec;
pub mod registry;
pub mod schema;
pub mod tree;

pub use error::AsterixError;
pub use fspec::Fspec;
pub use registry::{BDS_CATEGORY, Registry};
pub use tree::{DataBlock, Field, FieldKind, Item, Leaf, ParsedData, RawValue, Record};
