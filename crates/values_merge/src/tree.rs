//! Configuration tree primitives.
//!
//! A configuration tree is a JSON-compatible nested mapping. Keys iterate in
//! sorted order, which keeps merges and scans deterministic. Every recursive
//! walk over a tree classifies values through [`ValueNode`] and matches on it
//! exhaustively.
//!
//! Paths are rendered in dotted form with bracketed sequence indices, e.g.
//! `containers[0].image`. The empty path denotes the tree root.
//!
//! Keys that contain `.`, `[` or `\` have those characters escaped with a
//! backslash, so `prometheus.io/scrape` under `annotations` renders as
//! `annotations.prometheus\.io/scrape`. The empty key renders as `[""]`.

use serde_json::{Map, Value};
use std::fmt;

/// A nested mapping from string keys to values.
pub type ConfigTree = Map<String, Value>;

/// Structural classification of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueNode<'a> {
    /// A nested mapping.
    Tree(&'a ConfigTree),
    /// An ordered sequence. Sequences are always replaced wholesale on merge.
    Sequence(&'a [Value]),
    /// A string leaf.
    Text(&'a str),
    /// A number, boolean or null leaf.
    Scalar(&'a Value),
}

impl<'a> ValueNode<'a> {
    /// Classifies a value into one of the four structural shapes.
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(tree) => ValueNode::Tree(tree),
            Value::Array(items) => ValueNode::Sequence(items),
            Value::String(text) => ValueNode::Text(text),
            Value::Null | Value::Bool(_) | Value::Number(_) => ValueNode::Scalar(value),
        }
    }

    /// Returns true for shapes that can own descendant paths.
    pub fn is_structural(&self) -> bool {
        match self {
            ValueNode::Tree(_) | ValueNode::Sequence(_) => true,
            ValueNode::Text(_) | ValueNode::Scalar(_) => false,
        }
    }
}

/// One step of a path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn key(name: impl Into<String>) -> Self {
        PathSegment::Key(name.into())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(name) => write!(f, "{}", join_path("", name)),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Renders segments into the dotted path form.
///
/// # Examples
///
/// ```rust
/// use values_merge::tree::{render_path, PathSegment};
///
/// let segments = vec![
///     PathSegment::key("containers"),
///     PathSegment::Index(0),
///     PathSegment::key("image"),
/// ];
/// assert_eq!(render_path(&segments), "containers[0].image");
/// ```
pub fn render_path(segments: &[PathSegment]) -> String {
    segments.iter().fold(String::new(), |path, segment| match segment {
        PathSegment::Key(name) => join_path(&path, name),
        PathSegment::Index(index) => index_path(&path, *index),
    })
}

/// Appends a mapping key to a path, escaping it.
///
/// # Examples
///
/// ```rust
/// use values_merge::tree::join_path;
///
/// assert_eq!(join_path("image", "tag"), "image.tag");
/// assert_eq!(join_path("annotations", "prometheus.io/scrape"), "annotations.prometheus\\.io/scrape");
/// assert_eq!(join_path("", ""), "[\"\"]");
/// ```
pub fn join_path(prefix: &str, key: &str) -> String {
    if key.is_empty() {
        return format!("{}{}", prefix, EMPTY_KEY);
    }
    let escaped = escape_key(key);
    if prefix.is_empty() {
        escaped
    } else {
        format!("{}.{}", prefix, escaped)
    }
}

const EMPTY_KEY: &str = "[\"\"]";

fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for ch in key.chars() {
        if matches!(ch, '\\' | '.' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Appends a sequence index to a path.
pub fn index_path(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}

/// Strips the last segment of a path.
///
/// The last segment is either a trailing `[i]` or `[""]` group or a `.key`
/// segment; escaped separators inside keys are skipped. Returns `None` for
/// single-segment paths and for the root.
pub fn parent_path(path: &str) -> Option<&str> {
    let mut last = None;
    let mut position = 0;
    while let Some(ch) = path[position..].chars().next() {
        match ch {
            '\\' => {
                position += 1;
                position += path[position..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            '.' => last = Some(position),
            '[' => {
                if let Some((_, rest)) = bracket_segment(&path[position + 1..]) {
                    last = Some(position);
                    position = path.len() - rest.len();
                    continue;
                }
            }
            _ => {}
        }
        position += ch.len_utf8();
    }
    last.filter(|&separator| separator > 0).map(|separator| &path[..separator])
}

/// Returns true when `candidate` lies strictly below `ancestor`.
pub fn is_descendant_path(candidate: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !candidate.is_empty();
    }
    candidate
        .strip_prefix(ancestor)
        .map(|rest| rest.starts_with('.') || rest.starts_with('['))
        .unwrap_or(false)
}

/// Returns true when `candidate` is `ancestor` or lies below it.
pub fn is_within_path(candidate: &str, ancestor: &str) -> bool {
    candidate == ancestor || is_descendant_path(candidate, ancestor)
}

/// Returns true when any segment of the path is a sequence index.
pub fn crosses_sequence(path: &str) -> bool {
    split_path(path)
        .iter()
        .any(|segment| matches!(segment, PathSegment::Index(_)))
}

/// Looks up the value at a dotted path, following keys and indices.
pub fn value_at<'a>(tree: &'a ConfigTree, path: &str) -> Option<&'a Value> {
    let mut segments = split_path(path).into_iter();
    let first = match segments.next()? {
        PathSegment::Key(name) => tree.get(&name)?,
        PathSegment::Index(_) => return None,
    };
    segments.try_fold(first, |current, segment| match segment {
        PathSegment::Key(name) => current.as_object()?.get(&name),
        PathSegment::Index(index) => current.as_array()?.get(index),
    })
}

/// Splits a rendered path back into segments, undoing key escapes.
///
/// Bracket groups that are neither a number nor `""` are kept as part of
/// the key.
pub fn split_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut rest = path;
    while let Some(ch) = rest.chars().next() {
        rest = &rest[ch.len_utf8()..];
        match ch {
            '\\' => {
                if let Some(escaped) = rest.chars().next() {
                    key.push(escaped);
                    rest = &rest[escaped.len_utf8()..];
                }
            }
            '.' => flush_key(&mut key, &mut segments),
            '[' => match bracket_segment(rest) {
                Some((segment, after)) => {
                    flush_key(&mut key, &mut segments);
                    segments.push(segment);
                    rest = after;
                }
                None => key.push('['),
            },
            _ => key.push(ch),
        }
    }
    flush_key(&mut key, &mut segments);
    segments
}

fn flush_key(key: &mut String, segments: &mut Vec<PathSegment>) {
    if !key.is_empty() {
        segments.push(PathSegment::Key(std::mem::take(key)));
    }
}

/// Parses the text after an opening bracket as `i]` or `""]`.
fn bracket_segment(rest: &str) -> Option<(PathSegment, &str)> {
    let close = rest.find(']')?;
    let inner = &rest[..close];
    let segment = if inner == "\"\"" {
        PathSegment::Key(String::new())
    } else if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
        PathSegment::Index(inner.parse().ok()?)
    } else {
        return None;
    };
    Some((segment, &rest[close + 1..]))
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
