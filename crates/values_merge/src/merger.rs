//! Layered values merging.
//!
//! Combines component defaults and user overrides into one tree, tracking the
//! origin of every value.
//!
//! # Precedence
//!
//! The merge follows a strict precedence order from lowest to highest:
//! 1. **Nested component defaults**, each followed by its parent's override block
//! 2. **Root component defaults**
//! 3. **User files**, in the order given
//! 4. **Typed assignments** (`key=value`)
//! 5. **String assignments** (`key=value`, value kept as text)
//! 6. **File-content assignments** (`key=<file content>`)
//!
//! # Examples
//!
//! ```rust
//! use values_merge::{Component, ComponentBundle, UserValues, ValuesMerger};
//! use serde_json::json;
//!
//! let root = Component::new(
//!     "web",
//!     json!({"image": {"repository": "nginx", "tag": "1.20"}}).as_object().cloned().unwrap(),
//! );
//! let bundle = ComponentBundle::new(root);
//! let user = UserValues::new()
//!     .with_file("prod.yaml", json!({"image": {"tag": "1.21"}}).as_object().cloned().unwrap())
//!     .with_set("image.repository=myorg/nginx");
//!
//! let merged = ValuesMerger::new().merge_values(&bundle, &user)?;
//!
//! assert_eq!(merged.tree["image"]["repository"], "myorg/nginx");
//! assert_eq!(merged.origins.get("image.tag").unwrap().locator, "prod.yaml");
//! # Ok::<(), values_merge::MergeError>(())
//! ```

use crate::assignment::{Assignment, AssignmentStyle};
use crate::component::ComponentSource;
use crate::errors::MergeResult;
use crate::merged_values::MergedValues;
use crate::origin::{Origin, OriginKind};
use crate::resolver::{Contribution, DependencyResolver};
use crate::session::MergeSession;
use crate::settings::MergeSettings;
use crate::tree::ConfigTree;
use crate::user_values::{FileContentAssignment, UserFile, UserValues};
use tracing::{debug, info, instrument};

/// Layered values merging engine.
///
/// Stateless apart from its settings: each call runs its own
/// [`MergeSession`], so one merger can serve any number of merges.
#[derive(Debug, Clone, Default)]
pub struct ValuesMerger {
    settings: MergeSettings,
}

impl ValuesMerger {
    /// Creates a merger with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MergeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Merges all layers for a component tree.
    ///
    /// # Arguments
    ///
    /// * `source` - Supplies the root component and its nested components
    /// * `user` - User override files and assignments
    ///
    /// # Returns
    ///
    /// The merged tree, the origin of every path in it, and the index of
    /// component prefixes.
    ///
    /// # Errors
    ///
    /// Returns `MergeError` if:
    /// - An assignment expression is malformed
    /// - A layer nests deeper than the configured maximum depth
    #[instrument(skip_all, fields(root = %source.root().name()))]
    pub fn merge_values<S: ComponentSource + ?Sized>(
        &self,
        source: &S,
        user: &UserValues,
    ) -> MergeResult<MergedValues> {
        let resolution = DependencyResolver::new(source).resolve();
        let mut session = MergeSession::with_settings(self.settings.clone());

        // Phase 1: nested component groups, then the root component's defaults
        self.apply_component_layers(&mut session, &resolution.contributions)?;

        // Phase 2: user files in order
        self.apply_user_files(&mut session, &user.files)?;

        // Phase 3: literal assignments, narrowest and strongest last
        self.apply_expressions(&mut session, &user.set, AssignmentStyle::Typed)?;
        self.apply_expressions(&mut session, &user.set_string, AssignmentStyle::Text)?;
        self.apply_file_contents(&mut session, &user.set_file)?;

        let (tree, origins) = session.finish();
        info!(
            paths = origins.len(),
            components = resolution.components.len(),
            "Merged values"
        );
        Ok(MergedValues {
            tree,
            origins,
            components: resolution.components,
        })
    }

    fn apply_component_layers(
        &self,
        session: &mut MergeSession,
        contributions: &[Contribution],
    ) -> MergeResult<()> {
        self.open_component_scopes(session, contributions)?;

        for contribution in contributions {
            debug!(
                prefix = %contribution.prefix,
                origin = %contribution.origin,
                "Merging component layer"
            );
            session.merge_at(&contribution.values, &contribution.origin, &contribution.prefix)?;
        }
        Ok(())
    }

    /// Creates each nested component's prefix node, parents first.
    ///
    /// Deeper groups are merged before their parents, so without this the
    /// node at `cache` would be attributed to whichever component nested
    /// under it was merged first.
    fn open_component_scopes(
        &self,
        session: &mut MergeSession,
        contributions: &[Contribution],
    ) -> MergeResult<()> {
        let mut scopes: Vec<&Contribution> = contributions
            .iter()
            .filter(|c| c.origin.kind == OriginKind::ComponentDefault && !c.prefix.is_empty())
            .collect();
        scopes.sort_by(|a, b| a.prefix.cmp(&b.prefix));

        for scope in scopes {
            session.merge_at(&ConfigTree::new(), &scope.origin, &scope.prefix)?;
        }
        Ok(())
    }

    fn apply_user_files(&self, session: &mut MergeSession, files: &[UserFile]) -> MergeResult<()> {
        for file in files {
            debug!(locator = %file.locator, "Merging user file");
            session.merge(&file.values, &Origin::user_file(&file.locator))?;
        }
        Ok(())
    }

    fn apply_expressions(
        &self,
        session: &mut MergeSession,
        expressions: &[String],
        style: AssignmentStyle,
    ) -> MergeResult<()> {
        for expression in expressions {
            for assignment in Assignment::parse_all(expression, style)? {
                let origin = Origin::user_literal(assignment.text.clone());
                session.apply_assignment(&assignment, &origin)?;
            }
        }
        Ok(())
    }

    fn apply_file_contents(
        &self,
        session: &mut MergeSession,
        assignments: &[FileContentAssignment],
    ) -> MergeResult<()> {
        for file_assignment in assignments {
            let assignment = Assignment::file_content(
                &file_assignment.key,
                &file_assignment.locator,
                &file_assignment.content,
            )?;
            let origin = Origin::user_file_content(assignment.text.clone());
            session.apply_assignment(&assignment, &origin)?;
        }
        Ok(())
    }
}

/// Merges all layers with the given settings.
///
/// Shorthand for `ValuesMerger::with_settings(settings.clone()).merge_values(source, user)`.
pub fn merge_values<S: ComponentSource + ?Sized>(
    source: &S,
    user: &UserValues,
    settings: &MergeSettings,
) -> MergeResult<MergedValues> {
    ValuesMerger::with_settings(settings.clone()).merge_values(source, user)
}

#[cfg(test)]
#[path = "merger_tests.rs"]
mod tests;
