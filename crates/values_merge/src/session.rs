//! The merge engine.
//!
//! A [`MergeSession`] exclusively owns the tree being built and the
//! [`OriginMap`] that tracks it. Layers are folded in one at a time, lowest
//! precedence first; each write records its origin and each structural
//! replacement purges the origins of what was replaced.
//!
//! # Replacement Policy
//!
//! - tree onto tree: merged key by key
//! - tree onto anything else: the target becomes an empty tree, then merged
//! - anything else: replaced wholesale, sequences included

use crate::assignment::Assignment;
use crate::errors::{MergeError, MergeResult};
use crate::origin::Origin;
use crate::origin_map::OriginMap;
use crate::settings::MergeSettings;
use crate::tree::{index_path, join_path, split_path, ConfigTree, PathSegment, ValueNode};
use serde_json::Value;
use tracing::debug;

/// Owns one merge in progress.
///
/// # Examples
///
/// ```rust
/// use values_merge::{MergeSession, Origin};
/// use serde_json::json;
///
/// let defaults = json!({"image": {"repository": "nginx", "tag": "1.20"}});
/// let overrides = json!({"image": {"tag": "1.21"}});
///
/// let mut session = MergeSession::new();
/// session.merge(defaults.as_object().unwrap(), &Origin::component_default("web", "web/values.yaml")).unwrap();
/// session.merge(overrides.as_object().unwrap(), &Origin::user_file("prod.yaml")).unwrap();
///
/// assert_eq!(session.tree()["image"]["tag"], "1.21");
/// assert_eq!(session.origins().get("image.tag").unwrap().locator, "prod.yaml");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MergeSession {
    tree: ConfigTree,
    origins: OriginMap,
    settings: MergeSettings,
}

impl MergeSession {
    /// Creates a session with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MergeSettings) -> Self {
        Self {
            tree: ConfigTree::new(),
            origins: OriginMap::new(),
            settings,
        }
    }

    /// Merges a whole layer at the tree root.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::MaxDepthExceeded` when the source nests deeper
    /// than the configured maximum.
    pub fn merge(&mut self, source: &ConfigTree, origin: &Origin) -> MergeResult<()> {
        self.merge_at(source, origin, "")
    }

    /// Merges a layer beneath a dotted key prefix.
    ///
    /// Prefix nodes that are missing, or that currently hold a non-tree value,
    /// become empty trees attributed to `origin`; existing trees along the
    /// prefix are left attributed to whoever wrote them.
    ///
    /// # Arguments
    ///
    /// * `source` - The layer to merge
    /// * `origin` - Provenance recorded for every path the layer writes
    /// * `prefix` - Dotted key path the layer is rooted at, empty for the root
    ///
    /// # Errors
    ///
    /// Returns `MergeError::InvalidAssignment` when the prefix names a
    /// sequence index, and `MergeError::MaxDepthExceeded` when the prefix or
    /// the layer nests too deep.
    pub fn merge_at(&mut self, source: &ConfigTree, origin: &Origin, prefix: &str) -> MergeResult<()> {
        let keys = prefix_keys(prefix)?;
        let max_depth = self.settings.max_depth;
        if keys.len() > max_depth {
            return Err(MergeError::MaxDepthExceeded {
                path: prefix.to_string(),
                max_depth,
            });
        }
        descend_and_merge(
            &mut self.tree,
            &keys,
            source,
            &mut self.origins,
            origin,
            "",
            max_depth,
        )
    }

    /// Applies one literal assignment as a narrow update.
    ///
    /// Only the named path is written. Intermediate values that are not of
    /// the required shape are replaced (and their descendants' origins
    /// purged); sequences are padded with null up to the addressed index.
    pub fn apply_assignment(&mut self, assignment: &Assignment, origin: &Origin) -> MergeResult<()> {
        let Some((PathSegment::Key(first), rest)) = assignment.path.split_first() else {
            return Err(MergeError::InvalidAssignment {
                assignment: assignment.text.clone(),
                reason: "path must begin with a key".to_string(),
            });
        };
        if assignment.path.len() > self.settings.max_depth {
            return Err(MergeError::MaxDepthExceeded {
                path: assignment.rendered_path(),
                max_depth: self.settings.max_depth,
            });
        }

        debug!(
            path = %assignment.rendered_path(),
            origin = %origin,
            "Applying assignment"
        );
        assign_in_tree(
            &mut self.tree,
            first,
            rest,
            assignment.value.clone(),
            join_path("", first),
            &mut self.origins,
            origin,
        );
        Ok(())
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn origins(&self) -> &OriginMap {
        &self.origins
    }

    /// Ends the session, handing back the merged tree and its origins.
    pub fn finish(self) -> (ConfigTree, OriginMap) {
        (self.tree, self.origins)
    }
}

/// Merges `source` into `target`, tracking origins under `prefix`.
///
/// # Arguments
///
/// * `target` - Tree receiving the layer
/// * `source` - Layer being merged
/// * `origins` - Origin map updated in lockstep with `target`
/// * `origin` - Provenance recorded for every written path
/// * `prefix` - Path of `target` within the whole tree
/// * `depth` - Current nesting depth of `target`
/// * `max_depth` - Depth at which the merge fails
///
/// # Errors
///
/// Returns `MergeError::MaxDepthExceeded` when recursion goes past `max_depth`.
pub fn merge_and_track(
    target: &mut ConfigTree,
    source: &ConfigTree,
    origins: &mut OriginMap,
    origin: &Origin,
    prefix: &str,
    depth: usize,
    max_depth: usize,
) -> MergeResult<()> {
    if depth > max_depth {
        return Err(MergeError::MaxDepthExceeded {
            path: prefix.to_string(),
            max_depth,
        });
    }

    for (key, source_value) in source {
        let full_path = join_path(prefix, key);
        match ValueNode::classify(source_value) {
            ValueNode::Tree(source_tree) => {
                let mut subtree = match target.remove(key) {
                    Some(Value::Object(existing)) => existing,
                    Some(_) | None => {
                        origins.purge_descendants(&full_path);
                        ConfigTree::new()
                    }
                };
                origins.record(&full_path, origin.clone());
                let merged = merge_and_track(
                    &mut subtree,
                    source_tree,
                    origins,
                    origin,
                    &full_path,
                    depth + 1,
                    max_depth,
                );
                target.insert(key.clone(), Value::Object(subtree));
                merged?;
            }
            ValueNode::Sequence(_) | ValueNode::Text(_) | ValueNode::Scalar(_) => {
                let previous = target.insert(key.clone(), source_value.clone());
                purge_if_structural(previous.as_ref(), &full_path, origins);
                origins.record(&full_path, origin.clone());
            }
        }
    }
    Ok(())
}

fn descend_and_merge(
    target: &mut ConfigTree,
    keys: &[String],
    source: &ConfigTree,
    origins: &mut OriginMap,
    origin: &Origin,
    path: &str,
    max_depth: usize,
) -> MergeResult<()> {
    let Some((key, rest)) = keys.split_first() else {
        let depth = split_path(path).len();
        return merge_and_track(target, source, origins, origin, path, depth, max_depth);
    };

    let full_path = join_path(path, key);
    let mut subtree = match target.remove(key) {
        Some(Value::Object(existing)) => existing,
        Some(_) | None => {
            origins.purge_descendants(&full_path);
            origins.record(&full_path, origin.clone());
            ConfigTree::new()
        }
    };
    let merged = descend_and_merge(&mut subtree, rest, source, origins, origin, &full_path, max_depth);
    target.insert(key.clone(), Value::Object(subtree));
    merged
}

/// Splits a layer prefix into the mapping keys it descends through.
fn prefix_keys(prefix: &str) -> MergeResult<Vec<String>> {
    split_path(prefix)
        .into_iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => Ok(key),
            PathSegment::Index(_) => Err(MergeError::InvalidAssignment {
                assignment: prefix.to_string(),
                reason: "a layer prefix cannot name a sequence index".to_string(),
            }),
        })
        .collect()
}

fn assign_in_tree(
    tree: &mut ConfigTree,
    key: &str,
    rest: &[PathSegment],
    value: Value,
    path: String,
    origins: &mut OriginMap,
    origin: &Origin,
) {
    if rest.is_empty() {
        let previous = tree.insert(key.to_string(), value);
        purge_if_structural(previous.as_ref(), &path, origins);
        origins.record(&path, origin.clone());
        return;
    }
    let slot = tree.entry(key.to_string()).or_insert(Value::Null);
    assign_in_value(slot, rest, value, path, origins, origin);
}

fn assign_in_value(
    slot: &mut Value,
    segments: &[PathSegment],
    value: Value,
    path: String,
    origins: &mut OriginMap,
    origin: &Origin,
) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };

    match segment {
        PathSegment::Key(key) => {
            let mut subtree = match std::mem::take(slot) {
                Value::Object(existing) => existing,
                _ => {
                    origins.purge_descendants(&path);
                    origins.record(&path, origin.clone());
                    ConfigTree::new()
                }
            };
            let child_path = join_path(&path, key);
            assign_in_tree(&mut subtree, key, rest, value, child_path, origins, origin);
            *slot = Value::Object(subtree);
        }
        PathSegment::Index(index) => {
            let mut items = match std::mem::take(slot) {
                Value::Array(existing) => existing,
                _ => {
                    origins.purge_descendants(&path);
                    origins.record(&path, origin.clone());
                    Vec::new()
                }
            };
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            let element_path = index_path(&path, *index);
            if rest.is_empty() {
                let previous = std::mem::replace(&mut items[*index], value);
                purge_if_structural(Some(&previous), &element_path, origins);
                origins.record(&element_path, origin.clone());
            } else {
                assign_in_value(&mut items[*index], rest, value, element_path, origins, origin);
            }
            *slot = Value::Array(items);
        }
    }
}

fn purge_if_structural(previous: Option<&Value>, path: &str, origins: &mut OriginMap) {
    let Some(previous) = previous else { return };
    if ValueNode::classify(previous).is_structural() {
        let removed = origins.purge_descendants(path);
        if removed > 0 {
            debug!(path = %path, removed, "Purged origins of replaced value");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
