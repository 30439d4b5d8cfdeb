//! Cheap filters deciding which string leaves might be image references.
//!
//! A string leaf is only parsed when one of these holds:
//! - its key is an image key (`image`, `containerImage`, ... or configured extras)
//! - its path matches a known image path shape (`sidecars[0].image`, `images[2]`)
//! - its value contains a well-known registry host followed by a path
//!
//! Paths matching a known non-image shape (`*.enabled`, `*.labels.*`,
//! `*.tag`, ...) are vetoed first, whatever their value.

use crate::errors::{DetectionError, DetectionResult};
use regex::Regex;

/// Keys whose string values are treated as image references.
pub const IMAGE_KEYS: &[&str] = &[
    "image",
    "images",
    "imagename",
    "imageref",
    "imagereference",
    "containerimage",
];

const IMAGE_PATH_PATTERNS: &[&str] = &[
    r"(?i)(^|\.)[a-z0-9_-]*image$",
    r"(?i)(^|\.)[a-z0-9_-]*images\[\d+\]$",
    r"(?i)(^|\.)(containers|initcontainers|ephemeralcontainers)\[\d+\]\.image$",
];

const NON_IMAGE_PATH_PATTERNS: &[&str] = &[
    r"(^|\.)enabled$",
    r"(^|\.)annotations\.",
    r"(^|\.)labels\.",
    r"(^|\.)port$",
    r"(^|\.)ports(\.|\[)",
    r"(^|\.)timeout$",
    r"(^|\.)serviceAccountName$",
    r"(^|\.)replicas$",
    r"(^|\.)resources\.",
    r"(^|\.)env(\.|\[)",
    r"(^|\.)command\[\d+\]$",
    r"(^|\.)args\[\d+\]$",
    r"\[\d+\]\.name$",
    r"(^|\.)(tag|registry|repository|digest)$",
];

const WELL_KNOWN_REGISTRY_PATTERN: &str = concat!(
    r"(?i)(docker\.io|index\.docker\.io|quay\.io|gcr\.io|[a-z0-9-]+\.gcr\.io|ghcr\.io",
    r"|registry\.k8s\.io|k8s\.gcr\.io|public\.ecr\.aws|mcr\.microsoft\.com",
    r"|registry\.gitlab\.com|nvcr\.io|[a-z0-9-]+-docker\.pkg\.dev|[a-z0-9-]+\.azurecr\.io",
    r"|[0-9]+\.dkr\.ecr\.[a-z0-9-]+\.amazonaws\.com)(:[0-9]+)?/",
);

/// Compiled candidate filters.
#[derive(Debug, Clone)]
pub struct Heuristics {
    image_keys: Vec<String>,
    image_paths: Vec<Regex>,
    non_image_paths: Vec<Regex>,
    well_known_registry: Regex,
}

impl Heuristics {
    /// Compiles the filters, adding `extra_image_keys` to the built-in keys.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InvalidConfiguration` for a blank extra key.
    pub fn new(extra_image_keys: &[String]) -> DetectionResult<Self> {
        let mut image_keys: Vec<String> = IMAGE_KEYS.iter().map(|k| k.to_string()).collect();
        for key in extra_image_keys {
            let key = key.trim();
            if key.is_empty() {
                return Err(DetectionError::InvalidConfiguration {
                    field: "extra_image_keys".to_string(),
                    reason: "Image keys cannot be empty".to_string(),
                });
            }
            image_keys.push(key.to_ascii_lowercase());
        }

        Ok(Self {
            image_keys,
            image_paths: compile_all(IMAGE_PATH_PATTERNS)?,
            non_image_paths: compile_all(NON_IMAGE_PATH_PATTERNS)?,
            well_known_registry: compile(WELL_KNOWN_REGISTRY_PATTERN)?,
        })
    }

    pub fn is_image_key(&self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        self.image_keys.iter().any(|k| *k == key)
    }

    pub fn is_image_path(&self, path: &str) -> bool {
        self.image_paths.iter().any(|re| re.is_match(path))
    }

    /// Returns true for paths that never hold an image reference.
    pub fn is_non_image_path(&self, path: &str) -> bool {
        self.non_image_paths.iter().any(|re| re.is_match(path))
    }

    pub fn mentions_well_known_registry(&self, value: &str) -> bool {
        self.well_known_registry.is_match(value.trim())
    }

    /// Decides whether a string leaf is worth parsing.
    ///
    /// # Arguments
    ///
    /// * `key` - Nearest mapping key above the leaf, if any
    /// * `path` - Full path of the leaf
    /// * `value` - The string value
    pub fn is_candidate(&self, key: Option<&str>, path: &str, value: &str) -> bool {
        if self.is_non_image_path(path) {
            return false;
        }
        key.is_some_and(|k| self.is_image_key(k))
            || self.is_image_path(path)
            || self.mentions_well_known_registry(value)
    }
}

fn compile_all(patterns: &[&str]) -> DetectionResult<Vec<Regex>> {
    patterns.iter().map(|pattern| compile(pattern)).collect()
}

fn compile(pattern: &str) -> DetectionResult<Regex> {
    Regex::new(pattern).map_err(|e| DetectionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "heuristics_tests.rs"]
mod tests;
