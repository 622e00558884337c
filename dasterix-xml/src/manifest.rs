//! Definitions manifest: the list of grammar files to load at startup.
//!
//! The manifest is a plain UTF-8 text file. Every non-blank line that
//! does not start with `#` is a path to a category XML file, resolved
//! against the manifest's own directory.

use std::path::Path;

use dasterix_core::Registry;
use dasterix_core::error::AsterixError;

use crate::loader::{MAX_PATH_LEN, load_category_file};

/// Outcome of a manifest load: how many grammar files made it into the
/// registry and how many were rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub loaded: usize,
    pub failed: usize,
}

/// Loads every grammar file listed in the manifest into `registry`.
///
/// A file that fails to parse is logged and counted in
/// [`LoadStats::failed`]; the remaining files still load, so the registry
/// can be queried for the categories that did. Only a manifest-level
/// problem (unreadable file, oversized path) is an error.
pub fn load_manifest(path: &Path, registry: &mut Registry) -> Result<LoadStats, AsterixError> {
    let display = path.display().to_string();
    if display.len() > MAX_PATH_LEN {
        return Err(AsterixError::Config(format!(
            "manifest path longer than {MAX_PATH_LEN} bytes"
        )));
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| AsterixError::Config(format!("cannot read manifest {display}: {e}")))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut stats = LoadStats::default();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let file = base.join(line);
        match load_category_file(&file) {
            Ok(category) => {
                log::info!(
                    "loaded category {} ({}) v{} from {}",
                    category.id,
                    category.name,
                    category.version,
                    file.display()
                );
                registry.insert(category);
                stats.loaded += 1;
            }
            Err(e) => {
                log::error!("{e}");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
