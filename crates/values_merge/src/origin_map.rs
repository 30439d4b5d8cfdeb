//! Path-to-origin tracking for merged values.
//!
//! The [`OriginMap`] is mutated in lockstep with the merge: every write to a
//! path records its origin, and replacing a structural value purges the
//! origins of everything that used to live beneath it. After a merge, the
//! entry for any path reflects the highest-precedence layer that touched it.
//!
//! # Ancestor Fallback
//!
//! Lookups through [`OriginMap::resolve`] fall back to the nearest ancestor
//! when a path has no entry of its own, so a value written as part of a larger
//! block reports the block's origin.
//!
//! ```rust
//! use values_merge::{Origin, OriginMap};
//!
//! let mut origins = OriginMap::new();
//! origins.record("image", Origin::user_file("prod.yaml"));
//!
//! let origin = origins.resolve("image.repository").unwrap();
//! assert_eq!(origin.locator, "prod.yaml");
//! ```

use crate::origin::Origin;
use crate::tree::parent_path;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Tracks which layer last wrote each path of a merged tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct OriginMap {
    /// Map of rendered path to origin, ordered by path.
    entries: BTreeMap<String, Origin>,
}

impl OriginMap {
    /// Creates a new empty origin map.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Records the origin of a path, replacing any previous entry.
    pub fn record(&mut self, path: &str, origin: Origin) {
        self.entries.insert(path.to_string(), origin);
    }

    /// Gets the origin recorded for exactly this path.
    pub fn get(&self, path: &str) -> Option<&Origin> {
        self.entries.get(path)
    }

    /// Resolves the origin of a path, falling back to the nearest ancestor.
    ///
    /// # Arguments
    ///
    /// * `path` - Rendered path, e.g. `image.repository` or `images[0]`
    ///
    /// # Returns
    ///
    /// The exact entry if present, otherwise the entry of the closest
    /// ancestor, or `None` when no ancestor has one either.
    pub fn resolve(&self, path: &str) -> Option<&Origin> {
        self.resolve_entry(path).map(|(_, origin)| origin)
    }

    /// Like [`resolve`](Self::resolve) but also returns the path the entry was found at.
    pub fn resolve_entry<'p>(&self, path: &'p str) -> Option<(&'p str, &Origin)> {
        let mut current = Some(path);
        while let Some(candidate) = current {
            if let Some(origin) = self.entries.get(candidate) {
                return Some((candidate, origin));
            }
            current = parent_path(candidate);
        }
        None
    }

    /// Deletes every entry strictly beneath `path`.
    ///
    /// Entries for `path.` children and `path[` sequence elements are removed;
    /// the entry for `path` itself and for unrelated siblings such as
    /// `pathSuffix` are kept.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub fn purge_descendants(&mut self, path: &str) -> usize {
        if path.is_empty() {
            let removed = self.entries.len();
            self.entries.clear();
            return removed;
        }
        self.purge_prefix(&format!("{}.", path)) + self.purge_prefix(&format!("{}[", path))
    }

    fn purge_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, _)| path.clone())
            .collect();
        for path in &doomed {
            self.entries.remove(path);
        }
        doomed.len()
    }

    /// Iterates over all entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Origin)> {
        self.entries
            .iter()
            .map(|(path, origin)| (path.as_str(), origin))
    }

    /// Returns all paths that have a recorded origin.
    pub fn paths(&self) -> Vec<&str> {
        self.entries.keys().map(|path| path.as_str()).collect()
    }

    /// Returns the number of recorded paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "origin_map_tests.rs"]
mod tests;
