//! Detection and analysis settings.
//!
//! Settings are plain serde structs with defaults for every field, so an
//! empty TOML document is a valid configuration.
//!
//! ```toml
//! [merge]
//! max_depth = 64
//!
//! [detection]
//! exclude_patterns = ["cache.metrics.**"]
//! extra_image_keys = ["proxyRef"]
//! fallback_tag = "stable"
//! ```

use crate::errors::{DetectionError, DetectionResult};
use crate::normalize::DEFAULT_TAG;
use crate::reference::ImageReference;
use serde::{Deserialize, Serialize};
use values_merge::MergeSettings;

/// Default bound on tree nesting during detection.
pub const DEFAULT_DETECTION_DEPTH: usize = 128;

/// Reference detector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Globs a reference path must match; empty means all paths.
    pub include_patterns: Vec<String>,
    /// Globs whose matching paths are never reported.
    pub exclude_patterns: Vec<String>,
    /// Additional keys whose string values are image references.
    pub extra_image_keys: Vec<String>,
    /// Tag used when neither the reference nor its component supplies one.
    pub fallback_tag: String,
    /// Nesting depth beyond which detection stops descending.
    pub max_depth: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            extra_image_keys: Vec::new(),
            fallback_tag: DEFAULT_TAG.to_string(),
            max_depth: DEFAULT_DETECTION_DEPTH,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    pub fn with_image_key(mut self, key: impl Into<String>) -> Self {
        self.extra_image_keys.push(key.into());
        self
    }

    pub fn with_fallback_tag(mut self, tag: impl Into<String>) -> Self {
        self.fallback_tag = tag.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InvalidConfiguration` if the fallback tag is
    /// not a valid tag or the maximum depth is zero.
    pub fn validate(&self) -> DetectionResult<()> {
        let probe = format!("validation/probe:{}", self.fallback_tag);
        if self.fallback_tag.trim().is_empty() || ImageReference::parse(&probe).is_err() {
            return Err(DetectionError::InvalidConfiguration {
                field: "fallback_tag".to_string(),
                reason: format!("'{}' is not a valid tag", self.fallback_tag),
            });
        }
        if self.max_depth == 0 {
            return Err(DetectionError::InvalidConfiguration {
                field: "max_depth".to_string(),
                reason: "Maximum depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for a full merge-and-detect run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub merge: MergeSettings,
    pub detection: DetectorConfig,
}

impl AnalysisSettings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::ParseError` for malformed TOML and
    /// `DetectionError::InvalidConfiguration` for values that fail
    /// [`DetectorConfig::validate`].
    pub fn from_toml_str(content: &str) -> DetectionResult<Self> {
        let settings: AnalysisSettings =
            toml::from_str(content).map_err(|e| DetectionError::ParseError {
                reason: e.to_string(),
            })?;
        settings.detection.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
