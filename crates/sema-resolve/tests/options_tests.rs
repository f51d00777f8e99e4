//! Tests for options.rs

use super::*;

#[test]
fn test_defaults() {
    let options = ResolveOptions::default();
    assert!(!options.dynamic_types);
    assert!(options.report_platform_nullability);
    assert!(options.tie_break.prefer_non_default);
    assert!(options.tie_break.prefer_non_generic);
    assert_eq!(options.max_expression_depth, MAX_EXPR_CHECK_DEPTH);
}

#[test]
fn test_from_json_keeps_missing_fields() {
    let options = ResolveOptions::from_json(r#"{ "dynamic_types": true, "tie_break": { "prefer_non_generic": false } }"#)
        .expect("valid options");
    assert!(options.dynamic_types);
    assert!(options.report_platform_nullability);
    assert!(options.tie_break.prefer_non_default);
    assert!(!options.tie_break.prefer_non_generic);
}

#[test]
fn test_from_json_rejects_unknown_fields() {
    let err = ResolveOptions::from_json(r#"{ "smart_casts": true }"#).expect_err("unknown field");
    assert!(err.to_string().starts_with("invalid resolve options"));
}

#[test]
fn test_from_json_rejects_wrong_types() {
    assert!(ResolveOptions::from_json(r#"{ "max_expression_depth": "deep" }"#).is_err());
}
