//! Merge engine settings.

use serde::{Deserialize, Serialize};

/// Default bound on tree nesting during a merge.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunables for a merge session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Maximum nesting depth a merge may descend to before failing.
    pub max_depth: usize,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MergeSettings {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
