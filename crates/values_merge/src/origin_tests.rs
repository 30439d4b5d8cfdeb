//! Tests for origin records.

use super::*;

#[test]
fn component_default_names_the_component() {
    let origin = Origin::component_default("cache", "cache/values.yaml");

    assert_eq!(origin.kind, OriginKind::ComponentDefault);
    assert_eq!(origin.component_name.as_deref(), Some("cache"));
    assert_eq!(origin.target, None);
    assert_eq!(origin.locator, "cache/values.yaml");
}

#[test]
fn user_origins_have_no_component() {
    let file = Origin::user_file("overrides.yaml");
    let literal = Origin::user_literal("image.tag=1.21");
    let content = Origin::user_file_content("config=./config.txt");

    assert_eq!(file.kind, OriginKind::UserFile);
    assert_eq!(literal.kind, OriginKind::UserLiteral);
    assert_eq!(content.kind, OriginKind::UserFileContent);
    assert!(file.component_name.is_none());
    assert!(literal.component_name.is_none());
    assert!(content.component_name.is_none());
}

#[test]
fn kinds_order_by_precedence() {
    assert!(OriginKind::ComponentDefault < OriginKind::ParentOverride);
    assert!(OriginKind::ParentOverride < OriginKind::UserFile);
    assert!(OriginKind::UserFile < OriginKind::UserLiteral);
    assert!(OriginKind::UserLiteral < OriginKind::UserFileContent);
}

#[test]
fn component_owned_kinds() {
    assert!(OriginKind::ComponentDefault.is_component_owned());
    assert!(OriginKind::ParentOverride.is_component_owned());
    assert!(!OriginKind::UserFile.is_component_owned());
    assert!(!OriginKind::UserLiteral.is_component_owned());
}

#[test]
fn display_includes_kind_and_locator() {
    let origin = Origin::parent_override("web", "cache", "web/values.yaml");

    assert_eq!(
        origin.to_string(),
        "parent-override web -> cache (web/values.yaml)"
    );
    assert_eq!(
        Origin::user_file("prod.yaml").to_string(),
        "user-file (prod.yaml)"
    );
}

#[test]
fn serializes_kind_in_kebab_case_and_skips_empty_fields() {
    let origin = Origin::user_literal("image.tag=1.21");
    let json = serde_json::to_value(&origin).unwrap();

    assert_eq!(
        json,
        serde_json::json!({"kind": "user-literal", "locator": "image.tag=1.21"})
    );
}
