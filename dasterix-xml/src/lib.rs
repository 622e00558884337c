//! # dasterix-xml
//!
//! Loader for ASTERIX category definition files.
//!
//! Grammar XML (the classic `asterix.dtd` vocabulary) is parsed with an
//! event-driven state machine into the `dasterix-core` schema types, and
//! a definitions manifest drives loading a whole configuration set into a
//! [`Registry`](dasterix_core::Registry).
//!
//! ```no_run
//! use dasterix_core::Registry;
//! use std::path::Path;
//!
//! let mut registry = Registry::new();
//! let stats = dasterix_xml::load_manifest(Path::new("config/definitions.ini"), &mut registry)?;
//! println!("{} categories loaded, {} failed", stats.loaded, stats.failed);
//! # Ok::<(), dasterix_core::AsterixError>(())
//! ```

pub mod loader;
pub mod manifest;

pub use loader::{MAX_PATH_LEN, load_category_file, parse_category};
pub use manifest::{LoadStats, load_manifest};
