//! Metric catalog.
//!
//! Every lifecycle metric the exporter can emit is listed here together with
//! its instrument kind, help text and fixed label names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GqlPromError, Result};

pub const LABEL_VERSION: &str = "version";
pub const LABEL_OPERATION_NAME: &str = "operationName";
pub const LABEL_OPERATION: &str = "operation";
pub const LABEL_SUCCESS: &str = "success";
pub const LABEL_FIELD_NAME: &str = "fieldName";
pub const LABEL_PARENT_TYPE: &str = "parentType";
pub const LABEL_PATH_LENGTH: &str = "pathLength";
pub const LABEL_RETURN_TYPE: &str = "returnType";

pub const SERVER_LABEL_NAMES: [&str; 1] = [LABEL_VERSION];
pub const QUERY_LABEL_NAMES: [&str; 2] = [LABEL_OPERATION_NAME, LABEL_OPERATION];
pub const FIELD_LABEL_NAMES: [&str; 4] = [
    LABEL_FIELD_NAME,
    LABEL_PARENT_TYPE,
    LABEL_PATH_LENGTH,
    LABEL_RETURN_TYPE,
];

/// Label names owned by the exporter itself; user labels may not reuse them.
/// `le` is reserved by histogram buckets.
pub const RESERVED_LABEL_NAMES: [&str; 9] = [
    LABEL_VERSION,
    LABEL_OPERATION_NAME,
    LABEL_OPERATION,
    LABEL_SUCCESS,
    LABEL_FIELD_NAME,
    LABEL_PARENT_TYPE,
    LABEL_PATH_LENGTH,
    LABEL_RETURN_TYPE,
    "le",
];

/// Histogram buckets in seconds.
pub const DEFAULT_DURATION_BUCKETS: [f64; 12] =
    [0.001, 0.005, 0.015, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 1.0, 5.0, 10.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricName {
    #[serde(rename = "graphql_server_starting")]
    ServerStarting,
    #[serde(rename = "graphql_server_closing")]
    ServerClosing,
    #[serde(rename = "graphql_query_started")]
    QueryStarted,
    #[serde(rename = "graphql_query_failed")]
    QueryFailed,
    #[serde(rename = "graphql_query_parse_started")]
    QueryParseStarted,
    #[serde(rename = "graphql_query_parse_failed")]
    QueryParseFailed,
    #[serde(rename = "graphql_query_validation_started")]
    QueryValidationStarted,
    #[serde(rename = "graphql_query_validation_failed")]
    QueryValidationFailed,
    #[serde(rename = "graphql_query_resolved")]
    QueryResolved,
    #[serde(rename = "graphql_query_execution_started")]
    QueryExecutionStarted,
    #[serde(rename = "graphql_query_execution_failed")]
    QueryExecutionFailed,
    #[serde(rename = "graphql_query_duration")]
    QueryDuration,
    #[serde(rename = "graphql_query_field_resolution_duration")]
    QueryFieldResolutionDuration,
}

impl MetricName {
    pub const ALL: [MetricName; 13] = [
        MetricName::ServerStarting,
        MetricName::ServerClosing,
        MetricName::QueryStarted,
        MetricName::QueryFailed,
        MetricName::QueryParseStarted,
        MetricName::QueryParseFailed,
        MetricName::QueryValidationStarted,
        MetricName::QueryValidationFailed,
        MetricName::QueryResolved,
        MetricName::QueryExecutionStarted,
        MetricName::QueryExecutionFailed,
        MetricName::QueryDuration,
        MetricName::QueryFieldResolutionDuration,
    ];

    /// Exposed metric name.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::ServerStarting => "graphql_server_starting",
            MetricName::ServerClosing => "graphql_server_closing",
            MetricName::QueryStarted => "graphql_query_started",
            MetricName::QueryFailed => "graphql_query_failed",
            MetricName::QueryParseStarted => "graphql_query_parse_started",
            MetricName::QueryParseFailed => "graphql_query_parse_failed",
            MetricName::QueryValidationStarted => "graphql_query_validation_started",
            MetricName::QueryValidationFailed => "graphql_query_validation_failed",
            MetricName::QueryResolved => "graphql_query_resolved",
            MetricName::QueryExecutionStarted => "graphql_query_execution_started",
            MetricName::QueryExecutionFailed => "graphql_query_execution_failed",
            MetricName::QueryDuration => "graphql_query_duration",
            MetricName::QueryFieldResolutionDuration => "graphql_query_field_resolution_duration",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            MetricName::ServerStarting => "The last timestamp when the GraphQL server was starting.",
            MetricName::ServerClosing => "The last timestamp when the GraphQL server was closing.",
            MetricName::QueryStarted => {
                "The amount of received queries (including parse and validation failures)."
            }
            MetricName::QueryFailed => "The amount of queries that failed.",
            MetricName::QueryParseStarted => "The amount of queries for which parsing has started.",
            MetricName::QueryParseFailed => "The amount of queries for which parsing has failed.",
            MetricName::QueryValidationStarted => {
                "The amount of queries for which validation has started."
            }
            MetricName::QueryValidationFailed => {
                "The amount of queries for which validation has failed."
            }
            MetricName::QueryResolved => "The amount of queries whose operation was resolved.",
            MetricName::QueryExecutionStarted => {
                "The amount of queries for which execution has started."
            }
            MetricName::QueryExecutionFailed => {
                "The amount of queries for which execution has failed."
            }
            MetricName::QueryDuration => "The total duration of a query in seconds.",
            MetricName::QueryFieldResolutionDuration => {
                "The total duration for resolving fields in seconds."
            }
        }
    }

    pub fn kind(self) -> MetricKind {
        match self {
            MetricName::ServerStarting | MetricName::ServerClosing => MetricKind::Gauge,
            MetricName::QueryDuration | MetricName::QueryFieldResolutionDuration => {
                MetricKind::Histogram
            }
            _ => MetricKind::Counter,
        }
    }

    /// Whether the metric is emitted from a request hook (and thus carries
    /// custom labels taken from the application context).
    pub fn is_request_scoped(self) -> bool {
        !matches!(self, MetricName::ServerStarting | MetricName::ServerClosing)
    }

    /// Instrument label names, in the order values must be supplied.
    pub fn label_names(self, custom: &[String]) -> Vec<String> {
        if !self.is_request_scoped() {
            return SERVER_LABEL_NAMES.iter().map(|s| s.to_string()).collect();
        }

        let mut names: Vec<String> = custom.to_vec();
        names.extend(QUERY_LABEL_NAMES.iter().map(|s| s.to_string()));
        match self {
            MetricName::QueryDuration => names.push(LABEL_SUCCESS.to_string()),
            MetricName::QueryFieldResolutionDuration => {
                names.extend(FIELD_LABEL_NAMES.iter().map(|s| s.to_string()))
            }
            _ => {}
        }
        names
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = GqlPromError;

    fn from_str(s: &str) -> Result<Self> {
        MetricName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| GqlPromError::BadOption(format!("unknown metric: {s}")))
    }
}

/// Prometheus label name rule: `[a-zA-Z_][a-zA-Z0-9_]*`, `__` prefix reserved.
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    if name.starts_with("__") {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
