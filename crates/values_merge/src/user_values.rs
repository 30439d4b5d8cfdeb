//! User-supplied override layers.
//!
//! Everything the user passes on top of the component defaults: override
//! files in order, then literal assignments in three flavours. Reading files
//! is the caller's job; this type only carries their parsed contents and
//! locators.

use crate::tree::ConfigTree;

/// A parsed user override file.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFile {
    /// Where the file was read from.
    pub locator: String,
    pub values: ConfigTree,
}

/// A `key=<file content>` assignment whose content has already been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContentAssignment {
    pub key: String,
    /// Where the content was read from.
    pub locator: String,
    pub content: String,
}

/// All user override layers, in the order they were given.
///
/// # Examples
///
/// ```rust
/// use values_merge::{ConfigTree, UserValues};
///
/// let user = UserValues::new()
///     .with_file("prod.yaml", ConfigTree::new())
///     .with_set("image.tag=1.21")
///     .with_set_string("build=0042");
///
/// assert_eq!(user.files.len(), 1);
/// assert!(!user.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserValues {
    /// Override files, lowest precedence first.
    pub files: Vec<UserFile>,

    /// Typed `key=value` expressions.
    pub set: Vec<String>,

    /// `key=value` expressions whose values stay strings.
    pub set_string: Vec<String>,

    /// Raw file-content assignments, highest precedence.
    pub set_file: Vec<FileContentAssignment>,
}

impl UserValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, locator: impl Into<String>, values: ConfigTree) -> Self {
        self.files.push(UserFile {
            locator: locator.into(),
            values,
        });
        self
    }

    pub fn with_set(mut self, expression: impl Into<String>) -> Self {
        self.set.push(expression.into());
        self
    }

    pub fn with_set_string(mut self, expression: impl Into<String>) -> Self {
        self.set_string.push(expression.into());
        self
    }

    pub fn with_set_file(
        mut self,
        key: impl Into<String>,
        locator: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.set_file.push(FileContentAssignment {
            key: key.into(),
            locator: locator.into(),
            content: content.into(),
        });
        self
    }

    /// Returns true when no user layer was supplied.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.set.is_empty()
            && self.set_string.is_empty()
            && self.set_file.is_empty()
    }
}
