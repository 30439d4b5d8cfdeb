//! Container image reference detection over merged values.
//!
//! Given the output of a [`values_merge`] merge, this crate finds every
//! container image reference in the tree, whether written as a
//! `{registry, repository, tag}` mapping or as a single string, normalizes
//! it, and attributes it to the layer and component it came from.
//!
//! # Pipeline
//!
//! 1. [`analyze`] merges the component and user layers
//! 2. [`ReferenceDetector`] walks the merged tree and reports
//!    [`ReferencePattern`]s sorted by path
//! 3. [`OverrideGenerator`] optionally turns the patterns into an override
//!    tree pointing at another registry
//!
//! Settings for the first two steps load from TOML through
//! [`AnalysisSettings::from_toml_str`].

pub mod analysis;
pub mod config;
pub mod detector;
pub mod errors;
pub mod heuristics;
pub mod normalize;
pub mod overrides;
pub mod path_filter;
pub mod pattern;
pub mod reference;

pub use analysis::{analyze, AnalysisOutcome};
pub use config::{AnalysisSettings, DetectorConfig};
pub use detector::{OriginContext, ReferenceDetector};
pub use errors::{DetectionError, DetectionResult, ReferenceParseError};
pub use normalize::{normalize, ReferenceStructure};
pub use overrides::{OverrideGenerator, PathStrategy};
pub use pattern::{PatternKind, ReferencePattern};
pub use reference::ImageReference;
