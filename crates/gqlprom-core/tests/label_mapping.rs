//! Field/server label mapping and skip policy.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use gqlprom_core::labels::{
    convert_ms_to_s, count_field_ancestors, field_labels, request_labels, server_labels,
};
use gqlprom_core::{AppLabels, FieldInfo, LabelSet, LabelSource, MetricName, SkipPolicy};

struct PathNode<'a> {
    parent: Option<&'a PathNode<'a>>,
}

fn field(name: &str) -> FieldInfo {
    FieldInfo {
        field_name: name.into(),
        parent_type: "Query".into(),
        path_length: 3,
        return_type: "[Post!]!".into(),
    }
}

#[test]
fn ancestors_include_the_field_itself() {
    let root = PathNode { parent: None };
    let index = PathNode { parent: Some(&root) };
    let leaf = PathNode { parent: Some(&index) };

    assert_eq!(count_field_ancestors(Some(&leaf), |n| n.parent), 3);
    assert_eq!(count_field_ancestors(Some(&root), |n| n.parent), 1);
    let none: Option<&PathNode> = None;
    assert_eq!(count_field_ancestors(none, |n| n.parent), 0);
}

#[test]
fn field_labels_are_stringified() {
    let labels = field_labels(&field("posts"));
    assert_eq!(labels.get("fieldName"), Some("posts"));
    assert_eq!(labels.get("parentType"), Some("Query"));
    assert_eq!(labels.get("pathLength"), Some("3"));
    assert_eq!(labels.get("returnType"), Some("[Post!]!"));
}

#[test]
fn server_labels_drop_missing_version() {
    assert!(server_labels(None).is_empty());
    assert_eq!(server_labels(Some("v7.0.0")).get("version"), Some("v7.0.0"));
}

#[test]
fn later_sources_override_earlier_ones() {
    let custom = LabelSet::new().with("operation", Some("spoofed"));
    let merged = custom.merge(&request_labels(Some("Q"), Some("query")));
    assert_eq!(merged.get("operation"), Some("query"));
    assert_eq!(merged.len(), 2);
}

#[test]
fn values_follow_instrument_order_and_fill_blanks() {
    let labels = request_labels(Some("Q"), None).with("success", Some("true"));
    let names = MetricName::QueryDuration.label_names(&["tenant".to_string()]);
    assert_eq!(labels.values_for(&names), vec!["", "Q", "", "true"]);
}

#[test]
fn milliseconds_become_seconds() {
    assert_eq!(convert_ms_to_s(1500.0), 1.5);
    assert_eq!(convert_ms_to_s(0.0), 0.0);
}

#[test]
fn app_labels_act_as_label_source() {
    use gqlprom_core::labels::custom_labels;

    let ctx = AppLabels::new().with("tenant", "acme");
    let labels = custom_labels(Some(&ctx), &["tenant".to_string(), "region".to_string()]);
    assert_eq!(labels.get("tenant"), Some("acme"));
    assert_eq!(labels.get("region"), None);
}

#[test]
fn skip_policy_disabled_and_predicates() {
    let mut policy = SkipPolicy::new().with_predicate(
        MetricName::QueryFieldResolutionDuration,
        |_labels: &LabelSet, _ctx: Option<&dyn LabelSource>, field: Option<&FieldInfo>| {
            field.map(|f| f.field_name.starts_with("__")).unwrap_or(false)
        },
    );
    policy.disable(MetricName::QueryParseStarted);

    let empty = LabelSet::new();
    assert!(policy.should_skip(MetricName::QueryParseStarted, &empty, None, None));
    assert!(!policy.should_skip(MetricName::QueryStarted, &empty, None, None));
    assert!(policy.should_skip(
        MetricName::QueryFieldResolutionDuration,
        &empty,
        None,
        Some(&field("__typename"))
    ));
    assert!(!policy.should_skip(
        MetricName::QueryFieldResolutionDuration,
        &empty,
        None,
        Some(&field("posts"))
    ));
    assert_eq!(policy.disabled().collect::<Vec<_>>(), vec![MetricName::QueryParseStarted]);
}

#[test]
fn skip_predicate_reads_request_context() {
    let policy = SkipPolicy::new().with_predicate(
        MetricName::QueryStarted,
        |_labels: &LabelSet, ctx: Option<&dyn LabelSource>, _field: Option<&FieldInfo>| {
            ctx.and_then(|c| c.label_value("client")).as_deref() == Some("healthcheck")
        },
    );

    let empty = LabelSet::new();
    let monitor = AppLabels::new().with("client", "healthcheck");
    let browser = AppLabels::new().with("client", "web");

    assert!(policy.should_skip(MetricName::QueryStarted, &empty, Some(&monitor), None));
    assert!(!policy.should_skip(MetricName::QueryStarted, &empty, Some(&browser), None));
    assert!(!policy.should_skip(MetricName::QueryStarted, &empty, None, None));
}
