//! Reference normalization.
//!
//! Applies registry canonicalization and defaults to a raw
//! [`ImageReference`]:
//! - A missing registry becomes `docker.io`; `index.docker.io` is folded
//!   into it
//! - Single-segment repositories on `docker.io` gain the `library/` namespace
//! - A missing tag (with no digest) becomes the supplied default tag

use crate::reference::ImageReference;
use serde::Serialize;
use std::fmt;

/// Registry assumed when a reference names none.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Namespace of official images on the default registry.
pub const LIBRARY_NAMESPACE: &str = "library";

/// Tag assumed when nothing better is known.
pub const DEFAULT_TAG: &str = "latest";

const LEGACY_DEFAULT_REGISTRY: &str = "index.docker.io";

/// A fully qualified image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceStructure {
    pub registry: String,
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl fmt::Display for ReferenceStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// Canonicalizes a registry host.
///
/// Trims and lowercases; an empty or missing registry and `index.docker.io`
/// both become `docker.io`. Ports are kept.
pub fn canonical_registry(registry: Option<&str>) -> String {
    let registry = registry.map(|r| r.trim().to_ascii_lowercase()).unwrap_or_default();
    if registry.is_empty() || registry == LEGACY_DEFAULT_REGISTRY {
        return DEFAULT_REGISTRY.to_string();
    }
    if let Some(port) = registry.strip_prefix(LEGACY_DEFAULT_REGISTRY) {
        if port.starts_with(':') {
            return format!("{}{}", DEFAULT_REGISTRY, port);
        }
    }
    registry
}

/// Normalizes a raw reference.
///
/// # Arguments
///
/// * `reference` - The reference as written
/// * `default_tag` - Tag to use when the reference has neither tag nor digest
///
/// # Examples
///
/// ```rust
/// use image_detector::normalize::normalize;
/// use image_detector::reference::ImageReference;
///
/// let raw = ImageReference::parse("nginx").unwrap();
/// let structure = normalize(&raw, "latest");
///
/// assert_eq!(structure.to_string(), "docker.io/library/nginx:latest");
/// ```
pub fn normalize(reference: &ImageReference, default_tag: &str) -> ReferenceStructure {
    let registry = canonical_registry(reference.registry.as_deref());
    let repository = reference.repository.trim().to_string();
    let repository = if registry == DEFAULT_REGISTRY && !repository.contains('/') {
        format!("{}/{}", LIBRARY_NAMESPACE, repository)
    } else {
        repository
    };

    let tag = match (&reference.tag, &reference.digest) {
        (Some(tag), _) => Some(tag.clone()),
        (None, Some(_)) => None,
        (None, None) => Some(default_tag.to_string()),
    };

    ReferenceStructure {
        registry,
        repository,
        tag,
        digest: reference.digest.clone(),
    }
}

/// Makes a registry host usable as a single repository path component.
///
/// The default registry becomes `dockerio`. A numeric port is dropped and
/// dots are removed, so `registry.local:5000` becomes `registrylocal`.
pub fn sanitize_registry_for_path(registry: &str) -> String {
    let registry = canonical_registry(Some(registry));
    if registry == DEFAULT_REGISTRY {
        return "dockerio".to_string();
    }

    let host = match registry.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => registry.as_str(),
    };
    host.replace('.', "")
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
