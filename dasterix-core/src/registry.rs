//! Definition registry: category number to loaded grammar.
//!
//! The registry is populated during initialization and read-only after:
//! the loader works through `&mut Registry`, everything else borrows it
//! shared. There is no interior mutability, so a `&Registry` is freely
//! shareable across decoding threads.

use crate::schema::Category;

/// Slot count: categories 0..=255 plus the BDS pseudo-category at 256.
const SLOTS: usize = 257;

/// Registry slot of the BDS register definitions.
pub const BDS_CATEGORY: u16 = 256;

pub struct Registry {
    categories: Box<[Option<Category>; SLOTS]>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            categories: Box::new([const { None }; SLOTS]),
        }
    }

    /// Stores a category, replacing any earlier definition with the same
    /// id. Load phase only — the decoder never calls this.
    pub fn insert(&mut self, category: Category) {
        let id = category.id as usize;
        debug_assert!(id < SLOTS);
        if id < SLOTS {
            self.categories[id] = Some(category);
        }
    }

    pub fn category(&self, id: u16) -> Option<&Category> {
        self.categories.get(id as usize)?.as_ref()
    }

    pub fn is_defined(&self, id: u16) -> bool {
        self.category(id).is_some()
    }

    /// Ids of all loaded categories, ascending.
    pub fn defined_categories(&self) -> impl Iterator<Item = u16> + '_ {
        (0..SLOTS as u16).filter(|&id| self.is_defined(id))
    }

    /// Layered description lookup: category name, item name, field long
    /// name, or enumerated value meaning, depending on how many levels
    /// are given. `None` at any unresolved step, never a placeholder.
    pub fn describe(
        &self,
        category: u16,
        item: Option<&str>,
        field: Option<&str>,
        value: Option<i64>,
    ) -> Option<String> {
        let cat = self.category(category)?;
        match item {
            None => Some(cat.name.clone()),
            Some(item) => cat.description(item, field, value),
        }
    }

    /// One `CATnnn:Innn:field` line per known bit field, for the loaded-
    /// definitions summary.
    pub fn descriptors(&self) -> String {
        let mut out = String::new();
        for (id, cat) in self
            .categories
            .iter()
            .enumerate()
            .filter_map(|(id, c)| c.as_ref().map(|c| (id, c)))
        {
            for item in &cat.items {
                for_each_field_name(&item.format, &mut |name| {
                    out.push_str(&format!("CAT{:03}:I{}:{}\n", id, item.id, name));
                });
            }
        }
        out
    }
}

fn for_each_field_name(format: &crate::schema::DataItemFormat, f: &mut impl FnMut(&str)) {
    use crate::schema::DataItemFormat::*;
    match format {
        Fixed(fixed) => {
            for bits in &fixed.bits {
                if !bits.is_spare() && !bits.fx {
                    f(&bits.short_name);
                }
            }
        }
        Variable(var) => {
            for part in &var.parts {
                for bits in &part.bits {
                    if !bits.is_spare() && !bits.fx {
                        f(&bits.short_name);
                    }
                }
            }
        }
        Compound(comp) => {
            for part in &comp.primary.parts {
                for bits in &part.bits {
                    if !bits.is_spare() && !bits.fx {
                        f(&bits.short_name);
                    }
                }
            }
            for part in &comp.parts {
                for_each_field_name(part, f);
            }
        }
        Repetitive(rep) => {
            for part in &rep.parts {
                for_each_field_name(part, f);
            }
        }
        Explicit(exp) => {
            if let Some(inner) = exp.inner.as_deref() {
                for_each_field_name(inner, f);
            }
        }
        Bds(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Bits, BitsValue, DataItemDescription, DataItemFormat, FixedFormat, Rule};

    fn registry_with_cat048() -> Registry {
        let mut fixed = FixedFormat::new(2);
        let mut sac = Bits::new(16, 9);
        sac.short_name = "SAC".into();
        sac.name = "System Area Code".into();
        let mut sic = Bits::new(8, 1);
        sic.short_name = "SIC".into();
        sic.name = "System Identification Code".into();
        sic.values.push(BitsValue {
            value: 35,
            meaning: "Test radar".into(),
        });
        fixed.bits.push(sac);
        fixed.bits.push(sic);

        let mut cat = Category::new(48, "Monoradar Target Reports", "1.30");
        cat.items.push(DataItemDescription {
            id: "010".into(),
            name: "Data Source Identifier".into(),
            definition: String::new(),
            note: String::new(),
            rule: Rule::Mandatory,
            format: DataItemFormat::Fixed(fixed),
        });

        let mut registry = Registry::new();
        registry.insert(cat);
        registry
    }

    #[test]
    fn defined_and_lookup() {
        let registry = registry_with_cat048();
        assert!(registry.is_defined(48));
        assert!(!registry.is_defined(62));
        assert!(!registry.is_defined(BDS_CATEGORY));
        assert_eq!(registry.category(48).unwrap().id, 48);
        assert_eq!(registry.defined_categories().collect::<Vec<_>>(), vec![48]);
    }

    #[test]
    fn describe_layers() {
        let registry = registry_with_cat048();
        assert_eq!(
            registry.describe(48, None, None, None).as_deref(),
            Some("Monoradar Target Reports")
        );
        assert_eq!(
            registry.describe(48, Some("010"), None, None).as_deref(),
            Some("Data Source Identifier")
        );
        assert_eq!(
            registry
                .describe(48, Some("010"), Some("SIC"), None)
                .as_deref(),
            Some("System Identification Code")
        );
        assert_eq!(
            registry
                .describe(48, Some("010"), Some("SIC"), Some(35))
                .as_deref(),
            Some("Test radar")
        );
        assert_eq!(registry.describe(48, Some("010"), Some("SIC"), Some(36)), None);
        assert_eq!(registry.describe(62, None, None, None), None);
    }

    #[test]
    fn describe_is_pure() {
        let registry = registry_with_cat048();
        let first = registry.describe(48, Some("010"), Some("SAC"), None);
        let second = registry.describe(48, Some("010"), Some("SAC"), None);
        assert_eq!(first, second);
    }

    #[test]
    fn descriptors_lists_fields() {
        let registry = registry_with_cat048();
        let lines = registry.descriptors();
        assert!(lines.contains("CAT048:I010:SAC"));
        assert!(lines.contains("CAT048:I010:SIC"));
    }

    #[test]
    fn insert_replaces_existing() {
        let mut registry = registry_with_cat048();
        registry.insert(Category::new(48, "Replacement", "2.0"));
        assert_eq!(registry.category(48).unwrap().name, "Replacement");
        assert!(registry.category(48).unwrap().items.is_empty());
    }
}
