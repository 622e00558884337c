//! Output filter: suppresses selected items or fields at render time.

use std::collections::HashSet;

/// A set of `(category, item, optional field)` entries consulted by the
/// serializers. An entry without a field name filters the whole item.
///
/// The filter is plain data: cheap to clone and safe to share between
/// renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    entries: HashSet<(u16, String, Option<String>)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter entry. Item ids are stored without the `I` prefix,
    /// matching the parsed tree.
    pub fn set(&mut self, category: u16, item: &str, field: Option<&str>) {
        let item = item.strip_prefix('I').unwrap_or(item).to_string();
        self.entries
            .insert((category, item, field.map(str::to_owned)));
    }

    /// Whether the given item (or one of its fields) is suppressed.
    /// Filtering a whole item also filters every field beneath it.
    pub fn is_filtered(&self, category: u16, item: &str, field: Option<&str>) -> bool {
        let item = item.strip_prefix('I').unwrap_or(item);
        if self
            .entries
            .contains(&(category, item.to_string(), None::<String>))
        {
            return true;
        }
        match field {
            None => false,
            Some(field) => {
                self.entries
                    .contains(&(category, item.to_string(), Some(field.to_string())))
            }
        }
    }

    /// True once any entry has been set; renderers use this to decide
    /// whether empty shells still need to be emitted.
    pub fn is_active(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
