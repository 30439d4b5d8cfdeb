//! Image reference detection over a merged values tree.
//!
//! The detector walks the tree depth-first, starting at the root mapping
//! itself. At each node:
//! 1. A mapping with non-empty string `repository` and `tag` fields (and a
//!    non-empty string `registry` when present) is reported as a map
//!    reference and not descended into.
//! 2. Any other mapping or sequence is descended into.
//! 3. A string leaf that passes the cheap [`Heuristics`] filters is parsed;
//!    it is reported when it parses and has path structure.
//!
//! Every reported reference is normalized with the default tag of its
//! owning component, attributed to the layer that produced it, and
//! filtered by the configured include and exclude globs. Results are
//! sorted by path.

use crate::config::DetectorConfig;
use crate::errors::{DetectionError, DetectionResult};
use crate::heuristics::Heuristics;
use crate::normalize::normalize;
use crate::path_filter::PathFilter;
use crate::pattern::{PatternKind, ReferencePattern};
use crate::reference::{contains_template_markers, ImageReference};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use values_merge::tree::{index_path, join_path};
use values_merge::{ComponentIndex, ConfigTree, MergedValues, Origin, OriginMap, ValueNode};

/// Provenance inputs for detection.
#[derive(Debug, Clone, Copy)]
pub struct OriginContext<'a> {
    pub origins: &'a OriginMap,
    pub components: &'a ComponentIndex,
}

impl<'a> OriginContext<'a> {
    pub fn new(origins: &'a OriginMap, components: &'a ComponentIndex) -> Self {
        Self {
            origins,
            components,
        }
    }
}

impl<'a> From<&'a MergedValues> for OriginContext<'a> {
    fn from(merged: &'a MergedValues) -> Self {
        Self::new(&merged.origins, &merged.components)
    }
}

/// Finds image references in merged values.
#[derive(Debug, Clone)]
pub struct ReferenceDetector {
    config: DetectorConfig,
    heuristics: Heuristics,
    filter: PathFilter,
}

impl ReferenceDetector {
    /// Creates a detector, compiling its filters.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError` if the configuration is invalid or a path
    /// glob cannot be compiled.
    pub fn new(config: DetectorConfig) -> DetectionResult<Self> {
        config.validate()?;
        let heuristics = Heuristics::new(&config.extra_image_keys)?;
        let filter = PathFilter::new(&config.include_patterns, &config.exclude_patterns)?;
        Ok(Self {
            config,
            heuristics,
            filter,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detects all image references in a tree.
    ///
    /// # Arguments
    ///
    /// * `tree` - The merged values tree
    /// * `context` - Origins and component scopes for the same merge
    ///
    /// # Returns
    ///
    /// References sorted by path. An empty tree gives an empty list.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::MissingInput` when the tree or context is absent.
    #[instrument(skip_all)]
    pub fn detect(
        &self,
        tree: Option<&ConfigTree>,
        context: Option<&OriginContext<'_>>,
    ) -> DetectionResult<Vec<ReferencePattern>> {
        let tree = tree.ok_or_else(|| DetectionError::MissingInput {
            input: "tree".to_string(),
            reason: "No merged values tree supplied".to_string(),
        })?;
        let context = context.ok_or_else(|| DetectionError::MissingInput {
            input: "context".to_string(),
            reason: "No origin context supplied".to_string(),
        })?;

        let mut scan = Scan {
            detector: self,
            context,
            patterns: Vec::new(),
        };
        match MapCandidate::from_tree(tree) {
            Some(candidate) => scan.record_map("", candidate),
            None => {
                for (key, value) in tree {
                    scan.visit(Some(key), value, &join_path("", key), 1);
                }
            }
        }

        let mut patterns = scan.patterns;
        patterns.sort_by(|a, b| a.path.cmp(&b.path));
        info!(count = patterns.len(), "Detected image references");
        Ok(patterns)
    }

    /// Detects references in the output of a merge.
    pub fn detect_merged(&self, merged: &MergedValues) -> DetectionResult<Vec<ReferencePattern>> {
        self.detect(Some(&merged.tree), Some(&OriginContext::from(merged)))
    }
}

/// Fields of a mapping that qualifies as a map reference.
struct MapCandidate<'a> {
    registry: Option<&'a str>,
    repository: &'a str,
    tag: &'a str,
    digest: Option<&'a str>,
}

impl<'a> MapCandidate<'a> {
    fn from_tree(tree: &'a ConfigTree) -> Option<Self> {
        let repository = non_empty_text(tree.get("repository")?)?;
        let tag = non_empty_text(tree.get("tag")?)?;
        let registry = match tree.get("registry") {
            Some(value) => Some(non_empty_text(value)?),
            None => None,
        };
        let digest = tree.get("digest").and_then(non_empty_text);

        let templated = [Some(repository), Some(tag), registry, digest]
            .into_iter()
            .flatten()
            .any(contains_template_markers);
        if templated {
            return None;
        }

        Some(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }
}

fn non_empty_text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|text| !text.is_empty())
}

/// State of one detection walk.
struct Scan<'a> {
    detector: &'a ReferenceDetector,
    context: &'a OriginContext<'a>,
    patterns: Vec<ReferencePattern>,
}

impl Scan<'_> {
    /// Visits a value; `key` is the nearest mapping key above it.
    fn visit(&mut self, key: Option<&str>, value: &Value, path: &str, depth: usize) {
        let node = ValueNode::classify(value);
        if node.is_structural() && depth > self.detector.config.max_depth {
            warn!(
                path = %path,
                max_depth = self.detector.config.max_depth,
                "Maximum detection depth reached, not descending"
            );
            return;
        }

        match node {
            ValueNode::Tree(tree) => match MapCandidate::from_tree(tree) {
                Some(candidate) => self.record_map(path, candidate),
                None => {
                    for (child_key, child) in tree {
                        self.visit(Some(child_key), child, &join_path(path, child_key), depth + 1);
                    }
                }
            },
            ValueNode::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.visit(key, item, &index_path(path, index), depth + 1);
                }
            }
            ValueNode::Text(text) => self.visit_text(key, text, path),
            ValueNode::Scalar(_) => {}
        }
    }

    fn visit_text(&mut self, key: Option<&str>, text: &str, path: &str) {
        if contains_template_markers(text) {
            debug!(path = %path, "Skipping templated value");
            return;
        }
        if !self.detector.heuristics.is_candidate(key, path, text) {
            return;
        }

        let reference = match ImageReference::parse(text) {
            Ok(reference) => reference,
            Err(e) => {
                debug!(path = %path, error = %e, "Candidate is not an image reference");
                return;
            }
        };
        if !reference.has_path_structure() {
            debug!(path = %path, value = %text, "Candidate has no path structure");
            return;
        }

        let origins = self.context.origins;
        let origin = origins.resolve(path);
        self.record(path, PatternKind::String, text.trim().to_string(), reference, origin);
    }

    fn record_map(&mut self, path: &str, candidate: MapCandidate<'_>) {
        let reference = ImageReference::from_parts(
            candidate.registry,
            candidate.repository,
            Some(candidate.tag),
            candidate.digest,
        );
        let raw_value = reference.to_reference_string();
        // The root mapping has no origin of its own; its fields do.
        let origins = self.context.origins;
        let origin = origins
            .resolve(path)
            .or_else(|| origins.resolve(&join_path(path, "repository")));
        self.record(path, PatternKind::Map, raw_value, reference, origin);
    }

    fn record(
        &mut self,
        path: &str,
        kind: PatternKind,
        raw_value: String,
        reference: ImageReference,
        origin: Option<&Origin>,
    ) {
        if !self.detector.filter.allows(path) {
            debug!(path = %path, "Reference excluded by path filter");
            return;
        }

        let scope = self.context.components.owner_of(path);
        let default_tag = scope
            .and_then(|s| s.metadata.app_version.as_deref())
            .unwrap_or(self.detector.config.fallback_tag.as_str());
        let structure = normalize(&reference, default_tag);

        let nested_owner = scope.filter(|s| !s.is_root());
        let original_registry = nested_owner
            .and(reference.registry.as_ref())
            .filter(|registry| **registry != structure.registry)
            .cloned();
        let owning_component_version = nested_owner.and_then(|s| s.metadata.app_version.clone());

        debug!(path = %path, reference = %structure, "Detected image reference");
        self.patterns.push(ReferencePattern {
            path: path.to_string(),
            source_path: scope
                .map(|s| s.relative_path(path))
                .unwrap_or_else(|| path.to_string()),
            kind,
            raw_value,
            structure,
            source_origin_locator: origin
                .map(|o| o.locator.clone())
                .unwrap_or_else(|| path.to_string()),
            origin_kind: origin.map(|o| o.kind),
            owning_component: scope.map(|s| s.metadata.name.clone()),
            original_registry,
            owning_component_version,
        });
    }
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
