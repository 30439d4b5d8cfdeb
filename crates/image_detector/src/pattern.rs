//! Detected image reference records.

use crate::normalize::ReferenceStructure;
use serde::Serialize;
use values_merge::OriginKind;

/// How a reference is written in the values tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// A mapping with `repository` and `tag` (and optionally `registry`).
    Map,
    /// A single reference string.
    String,
}

/// One image reference found in a merged tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferencePattern {
    /// Path in the merged tree.
    pub path: String,
    /// Path relative to the owning component's own values.
    pub source_path: String,
    pub kind: PatternKind,
    /// The reference as written, before defaults.
    pub raw_value: String,
    pub structure: ReferenceStructure,
    /// Locator of the layer that produced the value; the path itself when unknown.
    pub source_origin_locator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_kind: Option<OriginKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owning_component: Option<String>,
    /// Registry as written, when it differs from the normalized one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_registry: Option<String>,
    /// Application version of the owning nested component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owning_component_version: Option<String>,
}
