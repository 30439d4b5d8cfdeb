//! Merge-then-detect pipeline.

use crate::config::AnalysisSettings;
use crate::detector::ReferenceDetector;
use crate::errors::DetectionResult;
use crate::pattern::ReferencePattern;
use serde::Serialize;
use tracing::{info, instrument};
use values_merge::{ComponentSource, MergedValues, UserValues, ValuesMerger};

/// Merged values and the image references found in them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub merged: MergedValues,
    pub patterns: Vec<ReferencePattern>,
}

impl AnalysisOutcome {
    /// Finds the reference reported at a merged path.
    pub fn pattern_at(&self, path: &str) -> Option<&ReferencePattern> {
        self.patterns
            .binary_search_by(|p| p.path.as_str().cmp(path))
            .ok()
            .and_then(|index| self.patterns.get(index))
    }
}

/// Merges all value layers for a component and detects image references.
///
/// # Arguments
///
/// * `source` - The root component and its nested components
/// * `user` - User override files and assignments
/// * `settings` - Merge and detection settings
///
/// # Errors
///
/// Returns `DetectionError::Merge` if the merge fails, or a configuration
/// error if the detector cannot be built. The detector is built first, so
/// bad settings fail before any merging.
///
/// # Examples
///
/// ```rust
/// use image_detector::{analyze, AnalysisSettings};
/// use values_merge::{Component, ComponentBundle, UserValues};
/// use serde_json::json;
///
/// let root = Component::new(
///     "web",
///     json!({"image": {"repository": "nginx", "tag": "1.25"}}).as_object().cloned().unwrap(),
/// );
/// let outcome = analyze(&ComponentBundle::new(root), &UserValues::new(), &AnalysisSettings::default())?;
///
/// assert_eq!(outcome.patterns[0].structure.to_string(), "docker.io/library/nginx:1.25");
/// # Ok::<(), image_detector::DetectionError>(())
/// ```
#[instrument(skip_all, fields(root = %source.root().name()))]
pub fn analyze<S: ComponentSource + ?Sized>(
    source: &S,
    user: &UserValues,
    settings: &AnalysisSettings,
) -> DetectionResult<AnalysisOutcome> {
    let detector = ReferenceDetector::new(settings.detection.clone())?;
    let merged = ValuesMerger::with_settings(settings.merge.clone()).merge_values(source, user)?;
    let patterns = detector.detect_merged(&merged)?;

    info!(references = patterns.len(), "Analysis complete");
    Ok(AnalysisOutcome { merged, patterns })
}
