//! Layered values merging with provenance.
//!
//! Merges the default values of a component and its nested components with
//! user-supplied override files and literal assignments into one tree, and
//! records which layer produced every value in it.
//!
//! # Layers
//!
//! From lowest to highest precedence:
//! 1. Nested component defaults, each under its parent's override block
//! 2. Root component defaults
//! 3. User override files, in order
//! 4. Typed, string and file-content assignments
//!
//! See [`ValuesMerger`] for the entry point and [`OriginMap`] for provenance
//! lookups.

pub mod assignment;
pub mod component;
pub mod component_index;
pub mod errors;
pub mod merged_values;
pub mod merger;
pub mod origin;
pub mod origin_map;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod tree;
pub mod user_values;

pub use assignment::{Assignment, AssignmentStyle};
pub use component::{Component, ComponentBundle, ComponentMetadata, ComponentSource, Dependency};
pub use component_index::{ComponentIndex, ComponentScope};
pub use errors::{MergeError, MergeResult};
pub use merged_values::MergedValues;
pub use merger::{merge_values, ValuesMerger};
pub use origin::{Origin, OriginKind};
pub use origin_map::OriginMap;
pub use resolver::{Contribution, DependencyResolver, Resolution};
pub use session::{merge_and_track, MergeSession};
pub use settings::MergeSettings;
pub use tree::{ConfigTree, PathSegment, ValueNode};
pub use user_values::{FileContentAssignment, UserFile, UserValues};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
