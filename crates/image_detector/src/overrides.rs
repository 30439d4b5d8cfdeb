//! Override generation for registry relocation.
//!
//! Turns detected references into a values tree that points every image at a
//! target registry. The tree has the same shape as the merged values, so it
//! can be supplied as the highest-precedence user file.

use crate::errors::{DetectionError, DetectionResult};
use crate::normalize::{sanitize_registry_for_path, ReferenceStructure};
use crate::pattern::{PatternKind, ReferencePattern};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use values_merge::tree::{crosses_sequence, split_path, PathSegment};
use values_merge::ConfigTree;

/// How a relocated repository path is derived from the source reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathStrategy {
    /// `<sanitized source registry>/<repository>`, e.g. `quayio/prometheus/node-exporter`.
    #[default]
    PrefixSourceRegistry,
    /// `<sanitized source registry>-<repository with dashes>`, e.g. `quayio-prometheus-node-exporter`.
    Flat,
}

impl PathStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathStrategy::PrefixSourceRegistry => "prefix-source-registry",
            PathStrategy::Flat => "flat",
        }
    }

    /// Computes the repository path under the target registry.
    pub fn target_repository(&self, structure: &ReferenceStructure) -> String {
        let prefix = sanitize_registry_for_path(&structure.registry);
        match self {
            PathStrategy::PrefixSourceRegistry => format!("{}/{}", prefix, structure.repository),
            PathStrategy::Flat => format!("{}-{}", prefix, structure.repository.replace('/', "-")),
        }
    }
}

impl fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathStrategy {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "prefix-source-registry" => Ok(PathStrategy::PrefixSourceRegistry),
            "flat" => Ok(PathStrategy::Flat),
            other => Err(DetectionError::InvalidConfiguration {
                field: "path_strategy".to_string(),
                reason: format!(
                    "Unknown path strategy '{}', expected 'prefix-source-registry' or 'flat'",
                    other
                ),
            }),
        }
    }
}

/// Builds override trees for a target registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideGenerator {
    target_registry: String,
    strategy: PathStrategy,
}

impl OverrideGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InvalidConfiguration` if the target registry
    /// is empty, contains whitespace, or carries a path.
    pub fn new(target_registry: impl Into<String>, strategy: PathStrategy) -> DetectionResult<Self> {
        let target_registry = target_registry.into().trim().to_ascii_lowercase();
        if target_registry.is_empty()
            || target_registry.contains('/')
            || target_registry.chars().any(char::is_whitespace)
        {
            return Err(DetectionError::InvalidConfiguration {
                field: "target_registry".to_string(),
                reason: format!("'{}' is not a registry host", target_registry),
            });
        }
        Ok(Self {
            target_registry,
            strategy,
        })
    }

    pub fn target_registry(&self) -> &str {
        &self.target_registry
    }

    pub fn strategy(&self) -> PathStrategy {
        self.strategy
    }

    /// Generates the override tree for a set of references.
    ///
    /// References already on the target registry and references below a
    /// sequence index are skipped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use image_detector::{OverrideGenerator, PathStrategy};
    ///
    /// let generator = OverrideGenerator::new("harbor.example.com", PathStrategy::Flat).unwrap();
    /// let overrides = generator.generate(&[]);
    /// assert!(overrides.is_empty());
    /// ```
    #[instrument(skip_all, fields(target = %self.target_registry, strategy = %self.strategy))]
    pub fn generate(&self, patterns: &[ReferencePattern]) -> ConfigTree {
        let mut overrides = ConfigTree::new();
        let mut written = 0usize;

        for pattern in patterns {
            if crosses_sequence(&pattern.path) {
                warn!(
                    path = %pattern.path,
                    "Reference is inside a sequence and cannot be overridden by path"
                );
                continue;
            }
            if pattern.structure.registry == self.target_registry {
                debug!(path = %pattern.path, "Reference already uses the target registry");
                continue;
            }

            let value = self.relocated_value(pattern);
            let keys: Vec<String> = split_path(&pattern.path)
                .into_iter()
                .filter_map(|segment| match segment {
                    PathSegment::Key(key) => Some(key),
                    PathSegment::Index(_) => None,
                })
                .collect();
            if insert_at(&mut overrides, &keys, value) {
                written += 1;
            } else {
                warn!(path = %pattern.path, "Override path conflicts with an earlier override");
            }
        }

        info!(overrides = written, "Generated registry overrides");
        overrides
    }

    fn relocated_value(&self, pattern: &ReferencePattern) -> Value {
        let structure = &pattern.structure;
        let repository = self.strategy.target_repository(structure);

        match pattern.kind {
            PatternKind::Map => {
                let mut map = ConfigTree::new();
                map.insert("registry".to_string(), json!(self.target_registry));
                map.insert("repository".to_string(), json!(repository));
                if let Some(tag) = &structure.tag {
                    map.insert("tag".to_string(), json!(tag));
                }
                if let Some(digest) = &structure.digest {
                    map.insert("digest".to_string(), json!(digest));
                }
                Value::Object(map)
            }
            PatternKind::String => {
                let relocated = ReferenceStructure {
                    registry: self.target_registry.clone(),
                    repository,
                    tag: structure.tag.clone(),
                    digest: structure.digest.clone(),
                };
                Value::String(relocated.to_string())
            }
        }
    }
}

/// Inserts a value at a key path, creating mappings on the way.
///
/// An empty path merges a mapping's fields into the root. Returns false when
/// an intermediate node exists and is not a mapping.
fn insert_at(tree: &mut ConfigTree, keys: &[String], value: Value) -> bool {
    let Some((last, parents)) = keys.split_last() else {
        return match value {
            Value::Object(fields) => {
                tree.extend(fields);
                true
            }
            _ => false,
        };
    };

    let mut current = tree;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(ConfigTree::new()));
        match slot {
            Value::Object(next) => current = next,
            _ => return false,
        }
    }
    current.insert(last.clone(), value);
    true
}

#[cfg(test)]
#[path = "overrides_tests.rs"]
mod tests;
