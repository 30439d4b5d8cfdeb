//! Raw image reference parsing.
//!
//! Splits a reference such as `quay.io/prometheus/node-exporter:v1.7.0` into
//! its registry, repository, tag and digest exactly as written. No defaults
//! are applied here; see [`crate::normalize`] for that.
//!
//! A leading path segment is taken as the registry only when it looks like a
//! host: it contains `.` or `:`, or is `localhost`.

use crate::errors::ReferenceParseError;

/// Maximum tag length accepted by registries.
pub const MAX_TAG_LENGTH: usize = 128;

/// Minimum number of hex characters in a digest.
const MIN_DIGEST_HEX: usize = 32;

/// An image reference split into its parts, without defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageReference {
    pub registry: Option<String>,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parses and validates a reference string.
    ///
    /// # Errors
    ///
    /// Returns a `ReferenceParseError` when the string is empty, contains
    /// template markers or whitespace, or any part fails validation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use image_detector::reference::ImageReference;
    ///
    /// let reference = ImageReference::parse("localhost:5000/team/app:1.0").unwrap();
    /// assert_eq!(reference.registry.as_deref(), Some("localhost:5000"));
    /// assert_eq!(reference.repository, "team/app");
    /// assert_eq!(reference.tag.as_deref(), Some("1.0"));
    ///
    /// let bare = ImageReference::parse("nginx").unwrap();
    /// assert_eq!(bare.registry, None);
    /// assert_eq!(bare.tag, None);
    /// ```
    pub fn parse(input: &str) -> Result<Self, ReferenceParseError> {
        let value = input.trim();
        if value.is_empty() {
            return Err(ReferenceParseError::Empty);
        }
        if contains_template_markers(value) {
            return Err(ReferenceParseError::TemplateMarkers {
                value: value.to_string(),
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ReferenceParseError::Whitespace {
                value: value.to_string(),
            });
        }

        let (name, digest) = split_digest(value);
        if let Some(digest) = digest {
            if !is_valid_digest(digest) {
                return Err(ReferenceParseError::InvalidDigest {
                    digest: digest.to_string(),
                });
            }
        }

        let (name, tag) = split_tag(name);
        if let Some(tag) = tag {
            if !is_valid_tag(tag) {
                return Err(ReferenceParseError::InvalidTag {
                    tag: tag.to_string(),
                });
            }
        }

        let (registry, repository) = split_registry(name);
        if let Some(registry) = registry {
            if !is_valid_registry(registry) {
                return Err(ReferenceParseError::InvalidRegistry {
                    registry: registry.to_string(),
                });
            }
        }
        if !is_valid_repository(repository) {
            return Err(ReferenceParseError::InvalidRepository {
                repository: repository.to_string(),
            });
        }

        Ok(Self {
            registry: registry.map(str::to_string),
            repository: repository.to_string(),
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
        })
    }

    /// Assembles a reference from the fields of a reference-shaped map.
    ///
    /// A registry-like prefix embedded in `repository` is split off; explicit
    /// `registry`, `tag` and `digest` fields win over anything embedded.
    /// Parts are not validated.
    pub fn from_parts(
        registry: Option<&str>,
        repository: &str,
        tag: Option<&str>,
        digest: Option<&str>,
    ) -> Self {
        let (name, embedded_digest) = split_digest(repository.trim());
        let (name, embedded_tag) = split_tag(name);
        let (embedded_registry, repository) = split_registry(name);

        Self {
            registry: registry.or(embedded_registry).map(str::to_string),
            repository: repository.to_string(),
            tag: tag.or(embedded_tag).map(str::to_string),
            digest: digest.or(embedded_digest).map(str::to_string),
        }
    }

    /// Returns true when the reference has a path separator.
    ///
    /// Slash-free strings such as `enabled` or `nginx` are too ambiguous to
    /// report as references on their own.
    pub fn has_path_structure(&self) -> bool {
        self.registry.is_some() || self.repository.contains('/')
    }

    /// Renders the reference as written: `[registry/]repository[:tag][@digest]`.
    pub fn to_reference_string(&self) -> String {
        let mut rendered = match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.repository),
            None => self.repository.clone(),
        };
        if let Some(tag) = &self.tag {
            rendered.push(':');
            rendered.push_str(tag);
        }
        if let Some(digest) = &self.digest {
            rendered.push('@');
            rendered.push_str(digest);
        }
        rendered
    }
}

/// Returns true when a path segment looks like a registry host.
pub fn is_registry_like(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

/// Returns true for strings containing both `{{` and `}}`.
pub fn contains_template_markers(value: &str) -> bool {
    value.contains("{{") && value.contains("}}")
}

fn split_digest(value: &str) -> (&str, Option<&str>) {
    match value.split_once('@') {
        Some((name, digest)) => (name, Some(digest)),
        None => (value, None),
    }
}

/// Splits a trailing `:tag`, ignoring colons that belong to a registry port.
fn split_tag(name: &str) -> (&str, Option<&str>) {
    let last_slash = name.rfind('/');
    match name.rfind(':') {
        Some(colon) if last_slash.map_or(true, |slash| colon > slash) => {
            (&name[..colon], Some(&name[colon + 1..]))
        }
        _ => (name, None),
    }
}

fn split_registry(name: &str) -> (Option<&str>, &str) {
    match name.split_once('/') {
        Some((first, rest)) if is_registry_like(first) => (Some(first), rest),
        _ => (None, name),
    }
}

fn is_valid_registry(registry: &str) -> bool {
    let (host, port) = match registry.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (registry, None),
    };
    if let Some(port) = port {
        if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        })
}

fn is_valid_repository(repository: &str) -> bool {
    !repository.is_empty() && repository.split('/').all(is_valid_path_component)
}

/// A lowercase alphanumeric run, optionally joined by `.`, `_`, `__` or dashes.
fn is_valid_path_component(component: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let (Some(first), Some(last)) = (component.chars().next(), component.chars().last()) else {
        return false;
    };
    if !alnum(first) || !alnum(last) {
        return false;
    }

    let mut separator = String::new();
    for c in component.chars() {
        if alnum(c) {
            let allowed = separator.is_empty()
                || separator == "."
                || separator == "_"
                || separator == "__"
                || separator.chars().all(|s| s == '-');
            if !allowed {
                return false;
            }
            separator.clear();
        } else if matches!(c, '.' | '_' | '-') {
            separator.push(c);
        } else {
            return false;
        }
    }
    true
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    tag.len() <= MAX_TAG_LENGTH
        && (first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn is_valid_digest(digest: &str) -> bool {
    let Some((algorithm, hex)) = digest.split_once(':') else {
        return false;
    };
    !algorithm.is_empty()
        && algorithm.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && algorithm
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '_' | '-'))
        && hex.len() >= MIN_DIGEST_HEX
        && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
