//! Include/exclude filtering of reference paths.
//!
//! Patterns are globs over dotted paths, matched with [`globset`] after each
//! path separator `.` is mapped to `/`:
//! - `*` matches within one path segment
//! - `**` matches across segments
//! - `?` matches one character other than the separator
//! - `{a,b}` matches either alternative
//!
//! `[` and `]` are literal so sequence indices can be written as they are
//! rendered, e.g. `sidecars[0].image`. Keys containing a dot are written
//! escaped, e.g. `my\.app.image`. Excludes always win; when any includes
//! are given, a path must match one.

use crate::errors::{DetectionError, DetectionResult};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use values_merge::tree::{split_path, PathSegment};

#[derive(Debug, Clone)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        }
    }
}

impl PathFilter {
    /// Compiles include and exclude globs.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InvalidPattern` for an empty glob, one with
    /// an empty path segment, or one `globset` cannot compile.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use image_detector::path_filter::PathFilter;
    ///
    /// let filter = PathFilter::new(&["cache.*.image".to_string()], &[]).unwrap();
    /// assert!(filter.allows("cache.metrics.image"));
    /// assert!(!filter.allows("cache.metrics.sidecar.image"));
    /// ```
    pub fn new(include: &[String], exclude: &[String]) -> DetectionResult<Self> {
        Ok(Self {
            include: compile_set(include)?,
            exclude: compile_set(exclude)?,
        })
    }

    pub fn allows(&self, path: &str) -> bool {
        let candidate = match_path(path);
        if self.exclude.is_match(&candidate) {
            return false;
        }
        self.include.is_empty() || self.include.is_match(&candidate)
    }
}

fn compile_set(patterns: &[String]) -> DetectionResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    builder.build().map_err(|e| DetectionError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

/// Compiles one dotted path glob.
///
/// # Errors
///
/// Returns `DetectionError::InvalidPattern` when the glob is malformed.
pub fn compile_glob(pattern: &str) -> DetectionResult<Glob> {
    let translated = translate(pattern)?;
    GlobBuilder::new(&translated)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|e| invalid(pattern, e.to_string()))
}

/// Rewrites a dotted glob into a `/`-separated one with literal brackets.
fn translate(pattern: &str) -> DetectionResult<String> {
    let glob = pattern.trim();
    if glob.is_empty() {
        return Err(invalid(pattern, "Pattern cannot be empty"));
    }

    let mut translated = String::with_capacity(glob.len() + 8);
    let mut segment_empty = true;
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if segment_empty {
                    return Err(invalid(pattern, "Pattern contains an empty path segment"));
                }
                translated.push('/');
                segment_empty = true;
                continue;
            }
            '\\' => {
                translated.push('\\');
                if let Some(escaped) = chars.next() {
                    translated.push(escaped);
                }
            }
            '[' | ']' => {
                translated.push('\\');
                translated.push(c);
            }
            other => translated.push(other),
        }
        segment_empty = false;
    }
    if segment_empty {
        return Err(invalid(pattern, "Pattern contains an empty path segment"));
    }
    Ok(translated)
}

/// Renders a merged path in the form globs are matched against.
fn match_path(path: &str) -> String {
    let mut candidate = String::with_capacity(path.len());
    for segment in split_path(path) {
        match segment {
            PathSegment::Key(key) if key.is_empty() => candidate.push_str("[\"\"]"),
            PathSegment::Key(key) => {
                if !candidate.is_empty() {
                    candidate.push('/');
                }
                candidate.push_str(&key);
            }
            PathSegment::Index(index) => candidate.push_str(&format!("[{}]", index)),
        }
    }
    candidate
}

fn invalid(pattern: &str, reason: impl Into<String>) -> DetectionError {
    DetectionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
#[path = "path_filter_tests.rs"]
mod tests;
