//! The ordered list of filters offered to the user.
//!
//! The first entry is always [`FilterName::NORMAL`], the identity filter a
//! fresh image starts on. The catalog is what a UI renders as selectable
//! controls; the session refuses names that are not in it.
//!
//! A catalog may list names the effect registry does not know. Those stay
//! selectable and render as a plain copy of the original with export
//! disabled.

use crate::imaging::EffectRegistry;
use crate::types::FilterName;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCatalog {
    entries: Vec<FilterName>,
}

impl FilterCatalog {
    /// `normal` followed by every registry effect, in registry order.
    pub fn from_registry(registry: &impl EffectRegistry) -> Self {
        Self::from_names(registry.names())
    }

    /// Build from an explicit ordering.
    ///
    /// `normal` is moved to the front (or inserted), duplicates and empty
    /// names are dropped.
    pub fn from_names<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<FilterName>,
    {
        let mut entries = vec![FilterName::normal()];
        for name in names.into_iter().map(Into::into) {
            if !name.as_str().is_empty() && !entries.contains(&name) {
                entries.push(name);
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[FilterName] {
        &self.entries
    }

    pub fn default_entry(&self) -> &FilterName {
        &self.entries[0]
    }

    pub fn contains(&self, name: &FilterName) -> bool {
        self.entries.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::from_names(Vec::<FilterName>::new())
    }
}
