//! Tests for the origin map.

use super::*;

fn defaults() -> Origin {
    Origin::component_default("web", "web/values.yaml")
}

fn file() -> Origin {
    Origin::user_file("prod.yaml")
}

#[test]
fn record_and_get_exact_paths() {
    let mut origins = OriginMap::new();
    origins.record("image.tag", file());

    assert_eq!(origins.get("image.tag"), Some(&file()));
    assert_eq!(origins.get("image"), None);
    assert_eq!(origins.len(), 1);
}

#[test]
fn record_replaces_previous_entry() {
    let mut origins = OriginMap::new();
    origins.record("image", defaults());
    origins.record("image", file());

    assert_eq!(origins.get("image"), Some(&file()));
    assert_eq!(origins.len(), 1);
}

#[test]
fn resolve_falls_back_to_nearest_ancestor() {
    let mut origins = OriginMap::new();
    origins.record("image", file());

    assert_eq!(origins.resolve("image.repository"), Some(&file()));
    assert_eq!(origins.resolve("image.a.b.c"), Some(&file()));
    assert_eq!(origins.resolve("other"), None);
}

#[test]
fn resolve_prefers_the_closest_entry() {
    let mut origins = OriginMap::new();
    origins.record("a", defaults());
    origins.record("a.b", file());

    assert_eq!(origins.resolve("a.b.c"), Some(&file()));
    assert_eq!(origins.resolve("a.x"), Some(&defaults()));
}

#[test]
fn resolve_strips_sequence_indices() {
    let mut origins = OriginMap::new();
    origins.record("containers", defaults());

    let (found_at, origin) = origins.resolve_entry("containers[2].image").unwrap();
    assert_eq!(found_at, "containers");
    assert_eq!(origin, &defaults());
}

#[test]
fn purge_removes_children_and_elements_only() {
    let mut origins = OriginMap::new();
    origins.record("image", defaults());
    origins.record("image.repository", defaults());
    origins.record("image.tag", defaults());
    origins.record("image[0]", defaults());
    origins.record("imagePullPolicy", defaults());
    origins.record("images", defaults());

    let removed = origins.purge_descendants("image");

    assert_eq!(removed, 3);
    assert_eq!(origins.paths(), vec!["image", "imagePullPolicy", "images"]);
}

#[test]
fn purge_of_root_clears_everything() {
    let mut origins = OriginMap::new();
    origins.record("a", defaults());
    origins.record("b.c", file());

    assert_eq!(origins.purge_descendants(""), 2);
    assert!(origins.is_empty());
}

#[test]
fn serializes_as_a_flat_path_map() {
    let mut origins = OriginMap::new();
    origins.record("image.tag", file());

    let json = serde_json::to_value(&origins).unwrap();
    assert_eq!(json["image.tag"]["kind"], "user-file");
    assert_eq!(json["image.tag"]["locator"], "prod.yaml");
}
