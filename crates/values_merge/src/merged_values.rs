//! The result of a layered merge.
//!
//! [`MergedValues`] holds the authoritative merged tree, the origin of every
//! path in it, and the index of which component owns which prefix. It is
//! read-only input to reference detection and serializes as a whole so a
//! caller can report it in any format.

use crate::component_index::{ComponentIndex, ComponentScope};
use crate::origin::Origin;
use crate::origin_map::OriginMap;
use crate::tree::ConfigTree;
use serde::Serialize;

/// Merged values with provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedValues {
    pub tree: ConfigTree,
    pub origins: OriginMap,
    pub components: ComponentIndex,
}

impl MergedValues {
    /// Resolves the origin of a path with nearest-ancestor fallback.
    pub fn origin_of(&self, path: &str) -> Option<&Origin> {
        self.origins.resolve(path)
    }

    /// Finds the component owning a path.
    pub fn owner_of(&self, path: &str) -> Option<ComponentScope<'_>> {
        self.components.owner_of(path)
    }
}

#[cfg(test)]
#[path = "merged_values_tests.rs"]
mod tests;
