//! Tests for layered values merging.

use super::*;
use crate::component::{Component, ComponentBundle, Dependency};
use crate::errors::MergeError;
use crate::origin::OriginKind;
use crate::tree::ConfigTree;
use serde_json::{json, Value};

fn tree(value: Value) -> ConfigTree {
    value.as_object().cloned().unwrap()
}

fn kind_at(merged: &MergedValues, path: &str) -> Option<OriginKind> {
    merged.origins.get(path).map(|origin| origin.kind)
}

/// web
/// └── cache (alias of redis, app version 7.2.4)
///     └── metrics (redis-exporter)
fn nested_bundle() -> ComponentBundle {
    let root = Component::new(
        "web",
        tree(json!({
            "image": {"repository": "nginx", "tag": "1.20"},
            "cache": {"image": {"tag": "7.2.5"}, "metrics": {"enabled": true}}
        })),
    )
    .with_app_version("2.0.0")
    .with_dependency(Dependency::new("redis").with_alias("cache"));

    let redis = Component::new(
        "redis",
        tree(json!({
            "image": {"repository": "bitnami/redis", "tag": "7.2.4"},
            "metrics": {"enabled": false, "port": 9121}
        })),
    )
    .with_app_version("7.2.4")
    .with_dependency(Dependency::new("redis-exporter").with_alias("metrics"));

    let exporter = Component::new(
        "redis-exporter",
        tree(json!({"enabled": false, "image": {"repository": "oliver006/redis_exporter", "tag": "v1.55.0"}})),
    );

    ComponentBundle::new(root)
        .with_component(redis)
        .with_component(exporter)
}

// ================================================================================================
// End-to-end precedence
// ================================================================================================

#[test]
fn defaults_file_and_literal_layer_in_order() {
    let bundle = ComponentBundle::new(Component::new(
        "web",
        tree(json!({"image": {"repository": "nginx", "tag": "1.20"}})),
    ));
    let user = UserValues::new()
        .with_file("prod.yaml", tree(json!({"image": {"tag": "1.21"}})))
        .with_set("image.repository=myorg/nginx");

    let merged = ValuesMerger::new().merge_values(&bundle, &user).unwrap();

    assert_eq!(
        merged.tree,
        tree(json!({"image": {"repository": "myorg/nginx", "tag": "1.21"}}))
    );
    assert_eq!(kind_at(&merged, "image.repository"), Some(OriginKind::UserLiteral));
    assert_eq!(kind_at(&merged, "image.tag"), Some(OriginKind::UserFile));
    assert_eq!(
        merged.origins.get("image.repository").unwrap().locator,
        "image.repository=myorg/nginx"
    );
}

#[test]
fn later_files_beat_earlier_files() {
    let bundle = ComponentBundle::new(Component::new("web", tree(json!({"replicas": 1}))));
    let user = UserValues::new()
        .with_file("base.yaml", tree(json!({"replicas": 2})))
        .with_file("prod.yaml", tree(json!({"replicas": 3})));

    let merged = ValuesMerger::new().merge_values(&bundle, &user).unwrap();

    assert_eq!(merged.tree["replicas"], json!(3));
    assert_eq!(merged.origins.get("replicas").unwrap().locator, "prod.yaml");
}

#[test]
fn assignment_flavours_apply_in_order() {
    let bundle = ComponentBundle::new(Component::new("web", ConfigTree::new()));
    let user = UserValues::new()
        .with_set("a=1,b=1,c=1")
        .with_set_string("b=2,c=2")
        .with_set_file("c", "./c.txt", "from file");

    let merged = ValuesMerger::new().merge_values(&bundle, &user).unwrap();

    assert_eq!(merged.tree["a"], json!(1));
    assert_eq!(merged.tree["b"], json!("2"));
    assert_eq!(merged.tree["c"], json!("from file"));
    assert_eq!(kind_at(&merged, "a"), Some(OriginKind::UserLiteral));
    assert_eq!(kind_at(&merged, "b"), Some(OriginKind::UserLiteral));
    assert_eq!(kind_at(&merged, "c"), Some(OriginKind::UserFileContent));
    assert_eq!(merged.origins.get("c").unwrap().locator, "c=./c.txt");
}

#[test]
fn user_layers_beat_component_layers() {
    let user = UserValues::new().with_file(
        "prod.yaml",
        tree(json!({"cache": {"image": {"tag": "7.4.0"}}})),
    );

    let merged = ValuesMerger::new()
        .merge_values(&nested_bundle(), &user)
        .unwrap();

    assert_eq!(merged.tree["cache"]["image"]["tag"], json!("7.4.0"));
    assert_eq!(kind_at(&merged, "cache.image.tag"), Some(OriginKind::UserFile));
}

// ================================================================================================
// Nested components
// ================================================================================================

#[test]
fn nested_defaults_land_under_their_prefix() {
    let merged = ValuesMerger::new()
        .merge_values(&nested_bundle(), &UserValues::new())
        .unwrap();

    assert_eq!(
        merged.tree["cache"]["image"]["repository"],
        json!("bitnami/redis")
    );
    let origin = merged.origins.get("cache.image.repository").unwrap();
    assert_eq!(origin.kind, OriginKind::ComponentDefault);
    assert_eq!(origin.component_name.as_deref(), Some("redis"));
    assert_eq!(origin.locator, "redis/values.yaml");
}

#[test]
fn parent_override_beats_nested_defaults() {
    let merged = ValuesMerger::new()
        .merge_values(&nested_bundle(), &UserValues::new())
        .unwrap();

    assert_eq!(merged.tree["cache"]["image"]["tag"], json!("7.2.5"));
    let origin = merged.origins.get("cache.image.tag").unwrap();
    assert_eq!(origin.kind, OriginKind::ParentOverride);
    assert_eq!(origin.component_name.as_deref(), Some("web"));
    assert_eq!(origin.target.as_deref(), Some("cache"));
}

#[test]
fn grandparent_override_reaches_deepest_component() {
    let merged = ValuesMerger::new()
        .merge_values(&nested_bundle(), &UserValues::new())
        .unwrap();

    // exporter default false, redis override false, web override true
    assert_eq!(merged.tree["cache"]["metrics"]["enabled"], json!(true));
    assert_eq!(merged.tree["cache"]["metrics"]["port"], json!(9121));
    assert_eq!(
        merged.tree["cache"]["metrics"]["image"]["repository"],
        json!("oliver006/redis_exporter")
    );
    let enabled = merged.origins.get("cache.metrics.enabled").unwrap();
    assert_eq!(enabled.component_name.as_deref(), Some("web"));
    let port = merged.origins.get("cache.metrics.port").unwrap();
    assert_eq!(port.kind, OriginKind::ParentOverride);
    assert_eq!(port.component_name.as_deref(), Some("redis"));
}

#[test]
fn component_prefix_nodes_belong_to_their_component() {
    let merged = ValuesMerger::new()
        .merge_values(&nested_bundle(), &UserValues::new())
        .unwrap();

    let cache = merged.origins.get("cache").unwrap();
    assert_eq!(cache.kind, OriginKind::ComponentDefault);
    assert_eq!(cache.component_name.as_deref(), Some("redis"));
    // the web block addressed to cache also names metrics, so web wrote it last
    let metrics = merged.origins.get("cache.metrics").unwrap();
    assert_eq!(metrics.kind, OriginKind::ParentOverride);
    assert_eq!(metrics.component_name.as_deref(), Some("web"));
}

#[test]
fn component_index_covers_every_resolved_prefix() {
    let merged = ValuesMerger::new()
        .merge_values(&nested_bundle(), &UserValues::new())
        .unwrap();

    let names: Vec<(&str, &str)> = merged
        .components
        .scopes()
        .map(|scope| (scope.prefix, scope.metadata.name.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("", "web"),
            ("cache", "redis"),
            ("cache.metrics", "redis-exporter"),
        ]
    );
}

#[test]
fn root_defaults_keep_their_own_keys() {
    let merged = ValuesMerger::new()
        .merge_values(&nested_bundle(), &UserValues::new())
        .unwrap();

    assert_eq!(merged.tree["image"]["repository"], json!("nginx"));
    assert_eq!(
        merged.origins.get("image.repository").unwrap().component_name.as_deref(),
        Some("web")
    );
}

// ================================================================================================
// Failures
// ================================================================================================

#[test]
fn malformed_assignment_aborts_the_merge() {
    let bundle = ComponentBundle::new(Component::new("web", ConfigTree::new()));
    let user = UserValues::new().with_set("image.tag");

    let error = ValuesMerger::new().merge_values(&bundle, &user).unwrap_err();

    assert!(matches!(error, MergeError::InvalidAssignment { .. }));
}

#[test]
fn depth_limit_applies_to_component_layers() {
    let bundle = ComponentBundle::new(Component::new(
        "web",
        tree(json!({"a": {"b": {"c": {"d": 1}}}})),
    ));
    let settings = MergeSettings::default().with_max_depth(2);

    let error = merge_values(&bundle, &UserValues::new(), &settings).unwrap_err();

    assert!(matches!(error, MergeError::MaxDepthExceeded { max_depth: 2, .. }));
}

#[test]
fn merging_is_deterministic() {
    let user = UserValues::new().with_set("cache.image.tag=8.0.0");
    let merger = ValuesMerger::new();

    let first = merger.merge_values(&nested_bundle(), &user).unwrap();
    let second = merger.merge_values(&nested_bundle(), &user).unwrap();

    assert_eq!(first, second);
}
