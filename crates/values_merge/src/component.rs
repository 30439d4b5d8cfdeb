//! Components and the source they are loaded from.
//!
//! A component is an independently versioned unit of configuration. It
//! declares default values and may nest other components, each addressed in
//! its parent's values namespace by alias when one is declared, otherwise by
//! name:
//!
//! ```text
//! web/                     values: { replicas: 2, cache: { port: 6380 } }
//! ├── cache (alias of redis)   values: { port: 6379, image: {...} }
//! └── metrics                  values: { enabled: false }
//! ```
//!
//! Loading components from disk or from a deployed instance is the job of a
//! [`ComponentSource`] implementation; [`ComponentBundle`] is the in-memory one.

use crate::tree::ConfigTree;
use serde::{Deserialize, Serialize};

/// A declared nested component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Name the nested component is looked up by.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Key addressing this dependency in the parent's values: the alias if declared, else the name.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Descriptive metadata of a component.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Version of the application the component deploys.
    ///
    /// Used as the default tag for untagged image references it owns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl ComponentMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A component with its declared default values.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub metadata: ComponentMetadata,

    /// Declared default values.
    pub values: ConfigTree,

    /// Where the default values were read from.
    pub values_locator: String,
}

impl Component {
    /// Creates a component with the conventional `<name>/values.yaml` locator.
    pub fn new(name: impl Into<String>, values: ConfigTree) -> Self {
        let metadata = ComponentMetadata::new(name);
        let values_locator = format!("{}/values.yaml", metadata.name);
        Self {
            metadata,
            values,
            values_locator,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.metadata.version = Some(version.into());
        self
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.metadata.app_version = Some(app_version.into());
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.metadata.dependencies.push(dependency);
        self
    }

    pub fn with_values_locator(mut self, locator: impl Into<String>) -> Self {
        self.values_locator = locator.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Supplies the root component and looks up nested components by name.
pub trait ComponentSource {
    /// The component being analyzed.
    fn root(&self) -> &Component;

    /// Finds a nested component by its declared name.
    ///
    /// Returns `None` when the component is not available; callers log and
    /// skip it.
    fn find_component(&self, name: &str) -> Option<&Component>;
}

/// An in-memory [`ComponentSource`].
///
/// # Examples
///
/// ```rust
/// use values_merge::{Component, ComponentBundle, ComponentSource, Dependency};
/// use values_merge::ConfigTree;
///
/// let root = Component::new("web", ConfigTree::new())
///     .with_dependency(Dependency::new("redis").with_alias("cache"));
/// let bundle = ComponentBundle::new(root)
///     .with_component(Component::new("redis", ConfigTree::new()));
///
/// assert_eq!(bundle.root().name(), "web");
/// assert!(bundle.find_component("redis").is_some());
/// assert!(bundle.find_component("cache").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBundle {
    root: Component,
    components: Vec<Component>,
}

impl ComponentBundle {
    pub fn new(root: Component) -> Self {
        Self {
            root,
            components: Vec::new(),
        }
    }

    /// Adds a nested component. A later component with the same name shadows earlier ones.
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }
}

impl ComponentSource for ComponentBundle {
    fn root(&self) -> &Component {
        &self.root
    }

    fn find_component(&self, name: &str) -> Option<&Component> {
        self.components
            .iter()
            .rev()
            .find(|component| component.name() == name)
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
