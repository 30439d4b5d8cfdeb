//! Lookup from merged-tree prefixes to the components that own them.
//!
//! The root component owns the empty prefix. A nested component owns the
//! prefix it was resolved at (e.g. `cache` or `web.cache`), so the owner of
//! any merged path is the component with the longest prefix containing it.

use crate::component::ComponentMetadata;
use crate::tree::is_within_path;
use serde::Serialize;
use std::collections::BTreeMap;

/// Prefix-to-component lookup produced by dependency resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ComponentIndex {
    scopes: BTreeMap<String, ComponentMetadata>,
}

/// The component owning a region of the merged tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentScope<'a> {
    /// Prefix of the component's values within the merged tree.
    pub prefix: &'a str,
    pub metadata: &'a ComponentMetadata,
}

impl<'a> ComponentScope<'a> {
    /// Returns true for the root component's scope.
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Strips the scope prefix from a merged path.
    ///
    /// The result is the path as the owning component declares it in its
    /// own values.
    pub fn relative_path(&self, path: &str) -> String {
        if self.is_root() {
            return path.to_string();
        }
        path.strip_prefix(self.prefix)
            .map(|rest| rest.strip_prefix('.').unwrap_or(rest))
            .unwrap_or(path)
            .to_string()
    }
}

impl ComponentIndex {
    /// Creates an index containing only the root component.
    pub fn new(root: ComponentMetadata) -> Self {
        let mut scopes = BTreeMap::new();
        scopes.insert(String::new(), root);
        Self { scopes }
    }

    /// Registers a nested component at its full prefix.
    pub fn insert(&mut self, prefix: impl Into<String>, metadata: ComponentMetadata) {
        self.scopes.insert(prefix.into(), metadata);
    }

    pub fn root(&self) -> Option<&ComponentMetadata> {
        self.scopes.get("")
    }

    /// Gets the component registered at exactly this prefix.
    pub fn get(&self, prefix: &str) -> Option<&ComponentMetadata> {
        self.scopes.get(prefix)
    }

    /// Finds the component owning a merged path.
    ///
    /// # Returns
    ///
    /// The scope with the longest prefix that is the path itself or one of
    /// its ancestors, or `None` when the index is empty.
    pub fn owner_of(&self, path: &str) -> Option<ComponentScope<'_>> {
        self.scopes
            .iter()
            .filter(|(prefix, _)| prefix.is_empty() || is_within_path(path, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, metadata)| ComponentScope {
                prefix: prefix.as_str(),
                metadata,
            })
    }

    /// Iterates over all scopes in prefix order.
    pub fn scopes(&self) -> impl Iterator<Item = ComponentScope<'_>> {
        self.scopes.iter().map(|(prefix, metadata)| ComponentScope {
            prefix: prefix.as_str(),
            metadata,
        })
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
#[path = "component_index_tests.rs"]
mod tests;
