//! Request lifecycle driven through a real async-graphql schema.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use async_graphql::Request;

use gqlprom_core::{AppLabels, LabelSource, MetricName};
use gqlprom_exporter::config::ExporterSettings;
use gqlprom_exporter::demo::{build_schema, DemoSchema};
use gqlprom_exporter::{create_plugin, Plugin, PluginOptions};

mod common;
use common::{quiet_settings, sample, scrape};

fn plugin_with(options: PluginOptions<()>) -> (Plugin<()>, DemoSchema) {
    let plugin = create_plugin(options).unwrap_or_else(|e| panic!("plugin setup: {e}"));
    let schema = build_schema(plugin.extension::<AppLabels>());
    (plugin, schema)
}

fn quiet_plugin() -> (Plugin<()>, DemoSchema) {
    plugin_with(PluginOptions::new().settings(quiet_settings()))
}

#[tokio::test]
async fn successful_query_records_every_stage() {
    let (plugin, schema) = quiet_plugin();

    let resp = schema
        .execute(Request::new("query GetPosts { posts { title } }").operation_name("GetPosts"))
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);

    let text = scrape(plugin.registry());
    let op = [("operationName", "GetPosts")];
    assert_eq!(sample(&text, "graphql_query_started", &op), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_parse_started", &op), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_validation_started", &op), Some(1.0));
    assert_eq!(
        sample(
            &text,
            "graphql_query_resolved",
            &[("operationName", "GetPosts"), ("operation", "query")]
        ),
        Some(1.0)
    );
    assert_eq!(
        sample(&text, "graphql_query_execution_started", &[("operation", "query")]),
        Some(1.0)
    );
    assert_eq!(
        sample(
            &text,
            "graphql_query_duration_count",
            &[("operation", "query"), ("success", "true")]
        ),
        Some(1.0)
    );

    // one `posts` field, then `title` once per list item
    assert_eq!(
        sample(
            &text,
            "graphql_query_field_resolution_duration_count",
            &[
                ("fieldName", "posts"),
                ("parentType", "QueryRoot"),
                ("pathLength", "1"),
                ("returnType", "[Post!]!")
            ]
        ),
        Some(1.0)
    );
    assert_eq!(
        sample(
            &text,
            "graphql_query_field_resolution_duration_count",
            &[("fieldName", "title"), ("parentType", "Post"), ("pathLength", "3")]
        ),
        Some(2.0)
    );

    assert!(!text.contains("graphql_query_failed{"));
    assert!(!text.contains("graphql_query_parse_failed{"));
}

#[tokio::test]
async fn started_counter_has_no_operation_type() {
    let (plugin, schema) = quiet_plugin();
    schema.execute("{ hello }").await;

    let text = scrape(plugin.registry());
    assert_eq!(
        sample(
            &text,
            "graphql_query_started",
            &[("operationName", ""), ("operation", "")]
        ),
        Some(1.0)
    );
    assert_eq!(
        sample(&text, "graphql_query_resolved", &[("operation", "query")]),
        Some(1.0)
    );
}

#[tokio::test]
async fn mutation_is_labelled_as_mutation() {
    let (plugin, schema) = quiet_plugin();
    let resp = schema
        .execute(r#"mutation { createPost(title: "x") { id } }"#)
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);

    let text = scrape(plugin.registry());
    assert_eq!(
        sample(
            &text,
            "graphql_query_duration_count",
            &[("operation", "mutation"), ("success", "true")]
        ),
        Some(1.0)
    );
}

#[tokio::test]
async fn parse_failure() {
    let (plugin, schema) = quiet_plugin();
    let resp = schema.execute("{ posts {").await;
    assert!(resp.is_err());

    let text = scrape(plugin.registry());
    assert_eq!(sample(&text, "graphql_query_parse_failed", &[]), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_failed", &[]), Some(1.0));
    assert_eq!(
        sample(&text, "graphql_query_duration_count", &[("success", "false")]),
        Some(1.0)
    );
    assert_eq!(sample(&text, "graphql_query_validation_started", &[]), None);
    assert_eq!(sample(&text, "graphql_query_resolved", &[]), None);
}

#[tokio::test]
async fn validation_failure() {
    let (plugin, schema) = quiet_plugin();
    let resp = schema.execute("{ doesNotExist }").await;
    assert!(resp.is_err());

    let text = scrape(plugin.registry());
    assert_eq!(sample(&text, "graphql_query_validation_started", &[]), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_validation_failed", &[]), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_failed", &[]), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_execution_started", &[]), None);
}

#[tokio::test]
async fn resolver_error_fails_execution() {
    let (plugin, schema) = quiet_plugin();
    let resp = schema.execute("{ broken }").await;
    assert!(resp.is_err());

    let text = scrape(plugin.registry());
    let q = [("operation", "query")];
    assert_eq!(sample(&text, "graphql_query_execution_started", &q), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_execution_failed", &q), Some(1.0));
    assert_eq!(sample(&text, "graphql_query_failed", &q), Some(1.0));
    assert_eq!(
        sample(
            &text,
            "graphql_query_duration_count",
            &[("operation", "query"), ("success", "false")]
        ),
        Some(1.0)
    );
}

#[tokio::test]
async fn custom_labels_come_from_request_data() {
    let settings = ExporterSettings {
        custom_labels: vec!["tenant".into(), "region".into()],
        ..quiet_settings()
    };
    let (plugin, schema) = plugin_with(PluginOptions::new().settings(settings));

    schema
        .execute(Request::new("{ hello }").data(AppLabels::new().with("tenant", "acme")))
        .await;
    schema.execute("{ hello }").await;

    let text = scrape(plugin.registry());
    assert_eq!(
        sample(
            &text,
            "graphql_query_started",
            &[("tenant", "acme"), ("region", "")]
        ),
        Some(1.0)
    );
    assert_eq!(
        sample(&text, "graphql_query_started", &[("tenant", "")]),
        Some(1.0)
    );
    assert_eq!(
        sample(
            &text,
            "graphql_query_field_resolution_duration_count",
            &[("tenant", "acme"), ("fieldName", "hello")]
        ),
        Some(1.0)
    );
}

#[tokio::test]
async fn default_labels_are_constant_labels() {
    let mut settings = quiet_settings();
    settings.default_labels.insert("service".into(), "api".into());
    let (plugin, schema) = plugin_with(PluginOptions::new().settings(settings));

    schema.execute("{ hello }").await;

    let text = scrape(plugin.registry());
    assert_eq!(
        sample(&text, "graphql_query_started", &[("service", "api")]),
        Some(1.0)
    );
}

#[tokio::test]
async fn disabled_metric_is_never_exported() {
    let settings = ExporterSettings {
        disabled_metrics: vec![
            MetricName::QueryFieldResolutionDuration,
            MetricName::QueryParseStarted,
        ],
        ..quiet_settings()
    };
    let (plugin, schema) = plugin_with(PluginOptions::new().settings(settings));

    schema.execute("{ posts { title } }").await;

    let text = scrape(plugin.registry());
    assert!(!text.contains("graphql_query_field_resolution_duration"));
    assert!(!text.contains("graphql_query_parse_started"));
    assert_eq!(sample(&text, "graphql_query_started", &[]), Some(1.0));
}

#[tokio::test]
async fn skip_predicate_filters_single_observations() {
    let options = PluginOptions::new()
        .settings(quiet_settings())
        .skip_metric(MetricName::QueryFieldResolutionDuration, |_, _, field| {
            field.is_some_and(|f| f.path_length > 1)
        })
        .skip_metric(MetricName::QueryStarted, |labels, _, _| {
            labels.get("operationName") == Some("Ignored")
        });
    let (plugin, schema) = plugin_with(options);

    schema
        .execute(Request::new("query Ignored { posts { title } }").operation_name("Ignored"))
        .await;
    schema
        .execute(Request::new("query Kept { hello }").operation_name("Kept"))
        .await;

    let text = scrape(plugin.registry());
    assert_eq!(
        sample(&text, "graphql_query_started", &[("operationName", "Ignored")]),
        None
    );
    assert_eq!(
        sample(&text, "graphql_query_started", &[("operationName", "Kept")]),
        Some(1.0)
    );
    assert_eq!(
        sample(
            &text,
            "graphql_query_field_resolution_duration_count",
            &[("fieldName", "posts")]
        ),
        Some(1.0)
    );
    assert_eq!(
        sample(
            &text,
            "graphql_query_field_resolution_duration_count",
            &[("fieldName", "title")]
        ),
        None
    );
}

#[tokio::test]
async fn skip_predicate_sees_application_context() {
    let settings = ExporterSettings {
        custom_labels: vec!["tenant".into()],
        ..quiet_settings()
    };
    // `client` is not a label; only the context knows it
    let options = PluginOptions::new()
        .settings(settings)
        .skip_metric(MetricName::QueryStarted, |_, ctx, _| {
            ctx.and_then(|c| c.label_value("client")).as_deref() == Some("monitor")
        })
        .skip_metric(MetricName::QueryDuration, |_, ctx, _| {
            ctx.and_then(|c| c.label_value("client")).as_deref() == Some("monitor")
        });
    let (plugin, schema) = plugin_with(options);

    let monitor = AppLabels::new().with("tenant", "ops").with("client", "monitor");
    let browser = AppLabels::new().with("tenant", "acme").with("client", "web");
    schema.execute(Request::new("{ hello }").data(monitor)).await;
    schema.execute(Request::new("{ hello }").data(browser)).await;

    let text = scrape(plugin.registry());
    assert_eq!(sample(&text, "graphql_query_started", &[("tenant", "ops")]), None);
    assert_eq!(
        sample(&text, "graphql_query_duration_count", &[("tenant", "ops")]),
        None
    );
    assert_eq!(sample(&text, "graphql_query_started", &[("tenant", "acme")]), Some(1.0));
    assert_eq!(
        sample(&text, "graphql_query_duration_count", &[("tenant", "acme")]),
        Some(1.0)
    );
    // metrics without a predicate still count the skipped client
    assert_eq!(
        sample(&text, "graphql_query_parse_started", &[("tenant", "ops")]),
        Some(1.0)
    );
}

#[tokio::test]
async fn server_lifecycle_gauges() {
    let (plugin, _schema) =
        plugin_with(PluginOptions::new().settings(quiet_settings()).server_version("v-test"));

    plugin.server_will_start();
    assert!(!plugin.is_draining());
    plugin.server_will_stop();
    assert!(plugin.is_draining());

    let text = scrape(plugin.registry());
    let started = sample(&text, "graphql_server_starting", &[("version", "v-test")])
        .expect("starting gauge");
    let closing = sample(&text, "graphql_server_closing", &[("version", "v-test")])
        .expect("closing gauge");

    // unix seconds, not milliseconds
    assert!(started > 1.0e9 && started < 1.0e11, "started={started}");
    assert!(closing >= started);
}
