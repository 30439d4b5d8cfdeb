//! Literal `key=value` assignments.
//!
//! Assignments are narrow updates applied after every file layer. The
//! grammar:
//!
//! - pairs are separated by commas: `a=1,b=2`
//! - keys are dotted paths with optional indices: `a.b[0].c`
//! - `\` escapes the next character, so `a\.b=x` names the single key `a.b`
//!   and `a=x\,y` assigns the text `x,y`
//! - `{x,y}` assigns a sequence
//!
//! Typed assignments coerce `true`, `false`, `null` and integers; text
//! assignments keep every value as a string. File-content assignments take the
//! supplied content verbatim.

use crate::errors::{MergeError, MergeResult};
use crate::tree::{render_path, PathSegment};
use serde_json::Value;

/// Largest sequence index an assignment may address.
pub const MAX_INDEX: usize = 65_536;

/// How assignment values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStyle {
    /// Coerce booleans, null and integers.
    Typed,
    /// Keep every value as a string.
    Text,
}

/// A single parsed assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub path: Vec<PathSegment>,
    pub value: Value,
    /// The `key=value` text the assignment came from, used as its origin locator.
    pub text: String,
}

impl Assignment {
    /// Parses a comma-separated list of assignments.
    ///
    /// # Arguments
    ///
    /// * `expression` - One or more `key=value` pairs
    /// * `style` - Whether values are coerced or kept as strings
    ///
    /// # Errors
    ///
    /// Returns `MergeError::InvalidAssignment` when a pair has no `=`, a key
    /// is empty or malformed, an index is invalid, or list braces are
    /// unbalanced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use values_merge::assignment::{Assignment, AssignmentStyle};
    /// use serde_json::json;
    ///
    /// let parsed = Assignment::parse_all("replicas=3,image.tag=1.21", AssignmentStyle::Typed).unwrap();
    /// assert_eq!(parsed.len(), 2);
    /// assert_eq!(parsed[0].value, json!(3));
    /// assert_eq!(parsed[1].rendered_path(), "image.tag");
    /// ```
    pub fn parse_all(expression: &str, style: AssignmentStyle) -> MergeResult<Vec<Assignment>> {
        let pairs = split_unescaped(expression, ',', true)
            .map_err(|reason| invalid(expression, reason))?;

        pairs
            .into_iter()
            .filter(|pair| !pair.trim().is_empty())
            .map(|pair| Self::parse_pair(pair, style))
            .collect()
    }

    /// Builds an assignment whose value is the verbatim content of a file.
    ///
    /// # Arguments
    ///
    /// * `key` - Dotted key path to assign
    /// * `locator` - Where the content came from, e.g. a file path
    /// * `content` - The content, already read by the caller
    pub fn file_content(key: &str, locator: &str, content: &str) -> MergeResult<Assignment> {
        let text = format!("{}={}", key, locator);
        let path = parse_key_path(key.trim()).map_err(|reason| invalid(&text, reason))?;

        Ok(Assignment {
            path,
            value: Value::String(content.to_string()),
            text,
        })
    }

    /// Renders the assigned path in dotted form.
    pub fn rendered_path(&self) -> String {
        render_path(&self.path)
    }

    fn parse_pair(pair: &str, style: AssignmentStyle) -> MergeResult<Assignment> {
        let Some((key, raw_value)) = split_key_value(pair) else {
            return Err(invalid(pair, "missing '='"));
        };
        let path = parse_key_path(key.trim()).map_err(|reason| invalid(pair, reason))?;
        let value = parse_value(raw_value, style).map_err(|reason| invalid(pair, reason))?;

        Ok(Assignment {
            path,
            value,
            text: pair.to_string(),
        })
    }
}

/// Parses a dotted key with optional `[i]` indices into segments.
pub fn parse_key_path(key: &str) -> Result<Vec<PathSegment>, String> {
    if key.is_empty() {
        return Err("empty key".to_string());
    }

    let mut segments = Vec::new();
    for part in split_unescaped(key, '.', false)? {
        let (name, mut indices) = split_at_unescaped(part, '[');
        let name = unescape(name);
        if name.is_empty() {
            return Err(format!("empty key segment in '{}'", key));
        }
        segments.push(PathSegment::Key(name));

        while let Some(rest) = indices.strip_prefix('[') {
            let close = rest
                .find(']')
                .ok_or_else(|| format!("unterminated index in '{}'", part))?;
            let index = rest[..close]
                .parse::<usize>()
                .map_err(|_| format!("invalid index '{}'", &rest[..close]))?;
            if index > MAX_INDEX {
                return Err(format!("index {} exceeds the maximum of {}", index, MAX_INDEX));
            }
            segments.push(PathSegment::Index(index));
            indices = &rest[close + 1..];
        }
        if !indices.is_empty() {
            return Err(format!("unexpected text '{}' after index", indices));
        }
    }
    Ok(segments)
}

fn parse_value(raw: &str, style: AssignmentStyle) -> Result<Value, String> {
    if let Some(inner) = raw.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
        if inner.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        let items = split_unescaped(inner, ',', true)?
            .into_iter()
            .map(|item| scalar_value(item, style))
            .collect();
        return Ok(Value::Array(items));
    }
    Ok(scalar_value(raw, style))
}

fn scalar_value(raw: &str, style: AssignmentStyle) -> Value {
    let text = unescape(raw);
    match style {
        AssignmentStyle::Text => Value::String(text),
        AssignmentStyle::Typed => typed_value(text),
    }
}

fn typed_value(text: String) -> Value {
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if text.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    // Leading zeros are kept as text so values like "007" survive.
    if text == "0" || !text.starts_with('0') {
        if let Ok(number) = text.parse::<i64>() {
            return Value::from(number);
        }
    }
    Value::String(text)
}

/// Splits on unescaped separators, optionally ignoring those inside `{}`.
fn split_unescaped(input: &str, separator: char, track_braces: bool) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;

    for (position, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' if track_braces => depth += 1,
            '}' if track_braces => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced '}'".to_string())?;
            }
            c if c == separator && depth == 0 => {
                parts.push(&input[start..position]);
                start = position + c.len_utf8();
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err("unbalanced '{'".to_string());
    }
    parts.push(&input[start..]);
    Ok(parts)
}

fn split_key_value(pair: &str) -> Option<(&str, &str)> {
    let (key, rest) = split_at_unescaped(pair, '=');
    rest.strip_prefix('=').map(|value| (key, value))
}

/// Splits before the first unescaped `marker`; the second half keeps the marker.
fn split_at_unescaped(input: &str, marker: char) -> (&str, &str) {
    let mut escaped = false;
    for (position, ch) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == marker {
            return (&input[..position], &input[position..]);
        }
    }
    (input, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn invalid(assignment: &str, reason: impl Into<String>) -> MergeError {
    MergeError::InvalidAssignment {
        assignment: assignment.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
#[path = "assignment_tests.rs"]
mod tests;
