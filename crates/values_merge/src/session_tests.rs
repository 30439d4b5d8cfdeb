//! Tests for the merge engine.

use super::*;
use crate::assignment::AssignmentStyle;
use serde_json::json;

fn tree(value: Value) -> ConfigTree {
    value.as_object().cloned().unwrap()
}

fn defaults() -> Origin {
    Origin::component_default("web", "web/values.yaml")
}

fn prod_file() -> Origin {
    Origin::user_file("prod.yaml")
}

fn assign(session: &mut MergeSession, expression: &str) {
    for assignment in Assignment::parse_all(expression, AssignmentStyle::Typed).unwrap() {
        let origin = Origin::user_literal(assignment.text.clone());
        session.apply_assignment(&assignment, &origin).unwrap();
    }
}

// ================================================================================================
// Layer merging
// ================================================================================================

#[test]
fn merge_records_every_written_path() {
    let mut session = MergeSession::new();
    session
        .merge(
            &tree(json!({"image": {"repository": "nginx", "tag": "1.20"}, "replicas": 1})),
            &defaults(),
        )
        .unwrap();

    assert_eq!(
        session.origins().paths(),
        vec!["image", "image.repository", "image.tag", "replicas"]
    );
}

#[test]
fn merge_twice_is_idempotent() {
    let source = tree(json!({
        "image": {"repository": "nginx", "tag": "1.20"},
        "args": ["--verbose"],
        "enabled": true
    }));
    let mut session = MergeSession::new();
    session.merge(&source, &defaults()).unwrap();
    let (first_tree, first_origins) = (session.tree().clone(), session.origins().clone());

    session.merge(&source, &defaults()).unwrap();

    assert_eq!(session.tree(), &first_tree);
    assert_eq!(session.origins(), &first_origins);
}

#[test]
fn higher_layer_wins_value_and_origin() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"image": {"tag": "1.20", "pullPolicy": "Always"}})), &defaults())
        .unwrap();
    session
        .merge(&tree(json!({"image": {"tag": "1.21"}})), &prod_file())
        .unwrap();

    assert_eq!(session.tree()["image"]["tag"], json!("1.21"));
    assert_eq!(session.tree()["image"]["pullPolicy"], json!("Always"));
    assert_eq!(session.origins().get("image.tag"), Some(&prod_file()));
    assert_eq!(session.origins().get("image.pullPolicy"), Some(&defaults()));
    assert_eq!(session.origins().get("image"), Some(&prod_file()));
}

#[test]
fn scalar_replacing_tree_purges_descendant_origins() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"key": {"sub": "a"}})), &defaults())
        .unwrap();
    session.merge(&tree(json!({"key": 123})), &prod_file()).unwrap();

    let (merged, origins) = session.finish();
    assert_eq!(merged, tree(json!({"key": 123})));
    assert_eq!(origins.paths(), vec!["key"]);
    assert_eq!(origins.get("key"), Some(&prod_file()));
}

#[test]
fn tree_replacing_scalar_starts_fresh() {
    let mut session = MergeSession::new();
    session.merge(&tree(json!({"key": "flat"})), &defaults()).unwrap();
    session
        .merge(&tree(json!({"key": {"sub": "nested"}})), &prod_file())
        .unwrap();

    assert_eq!(session.tree()["key"], json!({"sub": "nested"}));
    assert_eq!(session.origins().get("key.sub"), Some(&prod_file()));
}

#[test]
fn sequences_are_replaced_wholesale() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"args": ["a", "b", "c"]})), &defaults())
        .unwrap();
    assign(&mut session, "args[2]=z");
    session.merge(&tree(json!({"args": ["x"]})), &prod_file()).unwrap();

    assert_eq!(session.tree()["args"], json!(["x"]));
    assert_eq!(session.origins().get("args[2]"), None);
    assert_eq!(session.origins().get("args"), Some(&prod_file()));
}

#[test]
fn null_overrides_like_any_scalar() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"resources": {"limits": {"cpu": "1"}}})), &defaults())
        .unwrap();
    session
        .merge(&tree(json!({"resources": null})), &prod_file())
        .unwrap();

    assert_eq!(session.tree()["resources"], Value::Null);
    assert_eq!(session.origins().paths(), vec!["resources"]);
}

#[test]
fn empty_key_replacement_purges_only_its_own_descendants() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"image": {"tag": "1.20"}, "": 1})), &defaults())
        .unwrap();
    session
        .merge(&tree(json!({"": {"x": 1}})), &prod_file())
        .unwrap();

    let origins = session.origins();
    assert_eq!(origins.paths(), vec!["[\"\"]", "[\"\"].x", "image", "image.tag"]);
    assert_eq!(origins.get("image.tag"), Some(&defaults()));
    assert_eq!(origins.get("[\"\"].x"), Some(&prod_file()));
    assert_eq!(origins.get("x"), None);
}

#[test]
fn dotted_keys_are_not_descendants_of_their_stem() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"a": {"x": 1}, "a.b": 2})), &defaults())
        .unwrap();
    session.merge(&tree(json!({"a": 5})), &prod_file()).unwrap();

    assert_eq!(session.origins().paths(), vec!["a", "a\\.b"]);
    assert_eq!(session.origins().get("a\\.b"), Some(&defaults()));
    assert_eq!(session.tree()["a.b"], json!(2));
}

#[test]
fn merge_at_accepts_escaped_prefix_keys() {
    let mut session = MergeSession::new();
    session
        .merge_at(&tree(json!({"enabled": true})), &defaults(), "sidecar\\.io")
        .unwrap();

    assert_eq!(session.tree()["sidecar.io"]["enabled"], json!(true));
    assert_eq!(session.origins().get("sidecar\\.io.enabled"), Some(&defaults()));
}

#[test]
fn merge_at_rejects_indexed_prefix() {
    let mut session = MergeSession::new();

    let error = session
        .merge_at(&tree(json!({"a": 1})), &defaults(), "containers[0]")
        .unwrap_err();

    assert!(matches!(error, MergeError::InvalidAssignment { .. }));
}

#[test]
fn assignment_to_dotted_root_key_records_escaped_path() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"sidecar": {"image": "a"}})), &defaults())
        .unwrap();
    assign(&mut session, r"sidecar\.io=enabled");

    assert_eq!(session.tree()["sidecar.io"], json!("enabled"));
    assert_eq!(session.origins().paths(), vec!["sidecar", "sidecar.image", r"sidecar\.io"]);
}

#[test]
fn merge_at_prefix_nests_the_layer() {
    let mut session = MergeSession::new();
    let origin = Origin::component_default("cache", "cache/values.yaml");
    session
        .merge_at(&tree(json!({"image": {"repository": "redis"}})), &origin, "web.cache")
        .unwrap();

    assert_eq!(session.tree()["web"]["cache"]["image"]["repository"], json!("redis"));
    assert_eq!(
        session.origins().get("web.cache.image.repository"),
        Some(&origin)
    );
    assert_eq!(session.origins().get("web"), Some(&origin));
}

#[test]
fn merge_at_existing_prefix_keeps_prefix_origin() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"cache": {"enabled": true}})), &defaults())
        .unwrap();
    session
        .merge_at(&tree(json!({"port": 6379})), &prod_file(), "cache")
        .unwrap();

    assert_eq!(session.origins().get("cache"), Some(&defaults()));
    assert_eq!(session.origins().get("cache.port"), Some(&prod_file()));
    assert_eq!(session.tree()["cache"]["enabled"], json!(true));
}

#[test]
fn merge_beyond_max_depth_fails() {
    let mut session = MergeSession::with_settings(MergeSettings::default().with_max_depth(2));
    let error = session
        .merge(&tree(json!({"a": {"b": {"c": {"d": 1}}}})), &defaults())
        .unwrap_err();

    assert_eq!(
        error,
        MergeError::MaxDepthExceeded {
            path: "a.b.c".to_string(),
            max_depth: 2,
        }
    );
}

#[test]
fn merge_at_max_depth_succeeds() {
    let mut session = MergeSession::with_settings(MergeSettings::default().with_max_depth(2));
    session
        .merge(&tree(json!({"a": {"b": {"c": 1}}})), &defaults())
        .unwrap();

    assert_eq!(session.tree()["a"]["b"]["c"], json!(1));
}

// ================================================================================================
// Assignments
// ================================================================================================

#[test]
fn assignment_touches_only_its_path() {
    let mut session = MergeSession::new();
    session
        .merge(
            &tree(json!({"image": {"repository": "nginx", "tag": "1.20"}})),
            &defaults(),
        )
        .unwrap();
    assign(&mut session, "image.repository=myorg/nginx");

    assert_eq!(session.tree()["image"]["repository"], json!("myorg/nginx"));
    assert_eq!(session.tree()["image"]["tag"], json!("1.20"));
    assert_eq!(
        session.origins().get("image.repository"),
        Some(&Origin::user_literal("image.repository=myorg/nginx"))
    );
    assert_eq!(session.origins().get("image"), Some(&defaults()));
}

#[test]
fn assignment_creates_missing_parents() {
    let mut session = MergeSession::new();
    assign(&mut session, "a.b.c=1");

    assert_eq!(session.tree(), &tree(json!({"a": {"b": {"c": 1}}})));
    assert_eq!(session.origins().paths(), vec!["a", "a.b", "a.b.c"]);
}

#[test]
fn assignment_pads_sequences_with_null() {
    let mut session = MergeSession::new();
    assign(&mut session, "hosts[2]=example.com");

    assert_eq!(session.tree()["hosts"], json!([null, null, "example.com"]));
    assert!(session.origins().get("hosts[2]").is_some());
}

#[test]
fn assignment_into_existing_sequence_element() {
    let mut session = MergeSession::new();
    session
        .merge(
            &tree(json!({"containers": [{"name": "app", "image": "nginx:1.20"}]})),
            &defaults(),
        )
        .unwrap();
    assign(&mut session, "containers[0].image=nginx:1.21");

    assert_eq!(
        session.tree()["containers"],
        json!([{"name": "app", "image": "nginx:1.21"}])
    );
    assert_eq!(
        session.origins().get("containers[0].image").map(|o| o.kind),
        Some(crate::origin::OriginKind::UserLiteral)
    );
    assert_eq!(session.origins().get("containers"), Some(&defaults()));
}

#[test]
fn assignment_through_scalar_replaces_it() {
    let mut session = MergeSession::new();
    session.merge(&tree(json!({"image": "nginx"})), &defaults()).unwrap();
    assign(&mut session, "image.tag=1.21");

    assert_eq!(session.tree()["image"], json!({"tag": "1.21"}));
    assert_eq!(
        session.origins().get("image").map(|o| o.kind),
        Some(crate::origin::OriginKind::UserLiteral)
    );
}

#[test]
fn scalar_assignment_over_tree_purges_descendants() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"image": {"repository": "nginx"}})), &defaults())
        .unwrap();
    assign(&mut session, "image=redis");

    assert_eq!(session.tree()["image"], json!("redis"));
    assert_eq!(session.origins().paths(), vec!["image"]);
}

#[test]
fn list_assignment_replaces_sequence() {
    let mut session = MergeSession::new();
    session
        .merge(&tree(json!({"ports": [1, 2, 3]})), &defaults())
        .unwrap();
    assign(&mut session, "ports[1]=9");
    assign(&mut session, "ports={80,443}");

    assert_eq!(session.tree()["ports"], json!([80, 443]));
    assert_eq!(session.origins().get("ports[1]"), None);
}

#[test]
fn assignment_beyond_max_depth_fails() {
    let mut session = MergeSession::with_settings(MergeSettings::default().with_max_depth(2));
    let assignment = Assignment::parse_all("a.b.c=1", AssignmentStyle::Typed)
        .unwrap()
        .remove(0);

    let error = session
        .apply_assignment(&assignment, &Origin::user_literal("a.b.c=1"))
        .unwrap_err();

    assert!(matches!(error, MergeError::MaxDepthExceeded { .. }));
}
