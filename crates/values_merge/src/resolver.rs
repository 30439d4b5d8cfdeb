//! Nested-component resolution.
//!
//! Turns a root component and its transitive nested components into an
//! ordered list of [`Contribution`]s for the merge engine. For each nested
//! component the group is its own defaults followed by the block its parent
//! addresses to it (alias or name key). Components are discovered parent
//! first, but their groups are emitted deepest first, so a component's
//! nested components are merged before the component's own defaults; the
//! root component's defaults come last.
//!
//! A component's own defaults never include the blocks it addresses to its
//! resolved nested components. Those are applied as parent overrides at the
//! nested component's prefix instead, which yields the same merged values
//! with provenance naming the parent.

use crate::component::{Component, ComponentSource};
use crate::component_index::ComponentIndex;
use crate::origin::Origin;
use crate::tree::{join_path, ConfigTree, ValueNode};
use tracing::{debug, info, instrument, warn};

/// One layer for the merge engine: a tree, where it goes, and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    /// Dotted key prefix the tree is merged under; empty for the root.
    pub prefix: String,
    pub values: ConfigTree,
    pub origin: Origin,
}

/// Output of dependency resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Contributions in merge order, ending with the root component's defaults.
    pub contributions: Vec<Contribution>,
    pub components: ComponentIndex,
}

/// Resolves nested components from a [`ComponentSource`].
///
/// Missing nested components, non-tree override blocks and dependency cycles
/// are logged and skipped; resolution itself never fails.
pub struct DependencyResolver<'a, S: ComponentSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: ComponentSource + ?Sized> DependencyResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Resolves the whole component tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use values_merge::{Component, ComponentBundle, Dependency, DependencyResolver, OriginKind};
    /// use serde_json::json;
    ///
    /// let root = Component::new("web", json!({"cache": {"port": 6380}}).as_object().cloned().unwrap())
    ///     .with_dependency(Dependency::new("redis").with_alias("cache"));
    /// let redis = Component::new("redis", json!({"port": 6379}).as_object().cloned().unwrap());
    /// let bundle = ComponentBundle::new(root).with_component(redis);
    ///
    /// let resolution = DependencyResolver::new(&bundle).resolve();
    /// let kinds: Vec<OriginKind> = resolution.contributions.iter().map(|c| c.origin.kind).collect();
    /// assert_eq!(
    ///     kinds,
    ///     vec![OriginKind::ComponentDefault, OriginKind::ParentOverride, OriginKind::ComponentDefault]
    /// );
    /// ```
    #[instrument(skip(self), fields(root = %self.source.root().name()))]
    pub fn resolve(&self) -> Resolution {
        let root = self.source.root();
        let mut components = ComponentIndex::new(root.metadata.clone());
        let mut contributions = Vec::new();
        let mut lineage = vec![root.name().to_string()];

        let resolved_keys =
            self.resolve_nested(root, "", &mut lineage, &mut components, &mut contributions);

        contributions.push(Contribution {
            prefix: String::new(),
            values: own_defaults(root, &resolved_keys),
            origin: Origin::component_default(root.name(), &root.values_locator),
        });

        info!(
            components = components.len(),
            contributions = contributions.len(),
            "Resolved component tree"
        );
        Resolution {
            contributions,
            components,
        }
    }

    /// Resolves the nested components of `parent`, appending their groups to `out`.
    ///
    /// # Returns
    ///
    /// The keys of the nested components that were resolved, so the parent's
    /// own defaults can leave their blocks out.
    fn resolve_nested(
        &self,
        parent: &Component,
        base: &str,
        lineage: &mut Vec<String>,
        components: &mut ComponentIndex,
        out: &mut Vec<Contribution>,
    ) -> Vec<String> {
        let mut resolved = Vec::new();

        for dependency in &parent.metadata.dependencies {
            let key = dependency.key();
            let Some(child) = self.source.find_component(&dependency.name) else {
                warn!(
                    parent = %parent.name(),
                    dependency = %dependency.name,
                    "Nested component not found, skipping"
                );
                continue;
            };
            if lineage.iter().any(|name| name == child.name()) {
                warn!(
                    parent = %parent.name(),
                    dependency = %dependency.name,
                    lineage = %lineage.join(" -> "),
                    "Dependency cycle detected, skipping"
                );
                continue;
            }

            let prefix = join_path(base, key);
            debug!(prefix = %prefix, component = %child.name(), "Resolving nested component");
            components.insert(prefix.clone(), child.metadata.clone());

            lineage.push(child.name().to_string());
            let nested_keys = self.resolve_nested(child, &prefix, lineage, components, out);
            lineage.pop();

            out.push(Contribution {
                prefix: prefix.clone(),
                values: own_defaults(child, &nested_keys),
                origin: Origin::component_default(child.name(), &child.values_locator),
            });

            match parent.values.get(key).map(ValueNode::classify) {
                Some(ValueNode::Tree(block)) => out.push(Contribution {
                    prefix,
                    values: block.clone(),
                    origin: Origin::parent_override(parent.name(), key, &parent.values_locator),
                }),
                Some(ValueNode::Sequence(_) | ValueNode::Text(_) | ValueNode::Scalar(_)) => {
                    warn!(
                        parent = %parent.name(),
                        key = %key,
                        "Override block for nested component is not a tree, ignoring"
                    );
                }
                None => {}
            }
            resolved.push(key.to_string());
        }
        resolved
    }
}

/// A component's declared values without the blocks addressed to its nested components.
fn own_defaults(component: &Component, nested_keys: &[String]) -> ConfigTree {
    component
        .values
        .iter()
        .filter(|(key, _)| !nested_keys.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
