//! Provenance records for merged values.
//!
//! An [`Origin`] tells which layer last wrote a path: a component's declared
//! defaults, a parent component's override block, a user override file, or a
//! user literal assignment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The layer kind that supplied a value.
///
/// Variants are listed from lowest to highest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginKind {
    /// Default values declared by a component.
    ComponentDefault,
    /// A block in a parent component's values addressed to a nested component.
    ParentOverride,
    /// A user-supplied override file.
    UserFile,
    /// A typed or string literal `key=value` assignment.
    UserLiteral,
    /// A `key=<file content>` assignment.
    UserFileContent,
}

impl OriginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginKind::ComponentDefault => "component-default",
            OriginKind::ParentOverride => "parent-override",
            OriginKind::UserFile => "user-file",
            OriginKind::UserLiteral => "user-literal",
            OriginKind::UserFileContent => "user-file-content",
        }
    }

    /// Returns true for kinds that come from component declarations rather than the user.
    pub fn is_component_owned(&self) -> bool {
        matches!(
            self,
            OriginKind::ComponentDefault | OriginKind::ParentOverride
        )
    }
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a single merged value.
///
/// # Examples
///
/// ```rust
/// use values_merge::{Origin, OriginKind};
///
/// let origin = Origin::parent_override("web", "cache", "web/values.yaml");
/// assert_eq!(origin.kind, OriginKind::ParentOverride);
/// assert_eq!(origin.component_name.as_deref(), Some("web"));
/// assert_eq!(origin.target.as_deref(), Some("cache"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub kind: OriginKind,

    /// Component whose declared values supplied the value.
    ///
    /// The component itself for defaults, the parent for parent overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,

    /// Alias or name key a parent override was addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// File path, assignment text, or component values locator.
    pub locator: String,
}

impl Origin {
    pub fn component_default(component: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            kind: OriginKind::ComponentDefault,
            component_name: Some(component.into()),
            target: None,
            locator: locator.into(),
        }
    }

    pub fn parent_override(
        parent: impl Into<String>,
        target: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            kind: OriginKind::ParentOverride,
            component_name: Some(parent.into()),
            target: Some(target.into()),
            locator: locator.into(),
        }
    }

    pub fn user_file(locator: impl Into<String>) -> Self {
        Self::from_user(OriginKind::UserFile, locator)
    }

    pub fn user_literal(assignment: impl Into<String>) -> Self {
        Self::from_user(OriginKind::UserLiteral, assignment)
    }

    pub fn user_file_content(assignment: impl Into<String>) -> Self {
        Self::from_user(OriginKind::UserFileContent, assignment)
    }

    fn from_user(kind: OriginKind, locator: impl Into<String>) -> Self {
        Self {
            kind,
            component_name: None,
            target: None,
            locator: locator.into(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.component_name, &self.target) {
            (Some(component), Some(target)) => {
                write!(f, "{} {} -> {} ({})", self.kind, component, target, self.locator)
            }
            (Some(component), None) => write!(f, "{} {} ({})", self.kind, component, self.locator),
            (None, _) => write!(f, "{} ({})", self.kind, self.locator),
        }
    }
}

#[cfg(test)]
#[path = "origin_tests.rs"]
mod tests;
