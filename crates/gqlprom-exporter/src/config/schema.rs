use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;

use serde::Deserialize;

use gqlprom_core::error::{GqlPromError, Result};
use gqlprom_core::metric::{is_valid_label_name, DEFAULT_DURATION_BUCKETS, RESERVED_LABEL_NAMES};
use gqlprom_core::MetricName;

/// Config file for the demo server binary.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub exporter: ExporterSettings,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GqlPromError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.exporter.validate()?;

        if self.server.graphql_path == self.exporter.metrics_endpoint_path {
            return Err(GqlPromError::BadOption(
                "server.graphql_path and exporter.metrics_endpoint_path must differ".into(),
            ));
        }
        if self.exporter.metrics_endpoint
            && OPS_PATHS.contains(&self.exporter.metrics_endpoint_path.as_str())
        {
            return Err(GqlPromError::BadOption(format!(
                "exporter.metrics_endpoint_path {} is reserved for ops endpoints",
                self.exporter.metrics_endpoint_path
            )));
        }

        Ok(())
    }
}

/// Routes the demo server mounts next to GraphQL.
pub const OPS_PATHS: [&str; 2] = ["/healthz", "/readyz"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            graphql_path: default_graphql_path(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen.parse::<SocketAddr>().map_err(|_| {
            GqlPromError::BadOption(format!("server.listen is not a socket address: {}", self.listen))
        })?;
        if !is_static_route(&self.graphql_path) {
            return Err(GqlPromError::BadOption(format!(
                "malformed server.graphql_path: {}",
                self.graphql_path
            )));
        }
        if OPS_PATHS.contains(&self.graphql_path.as_str()) {
            return Err(GqlPromError::BadOption(format!(
                "server.graphql_path {} is reserved for ops endpoints",
                self.graphql_path
            )));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:4000".into()
}
fn default_graphql_path() -> String {
    "/graphql".into()
}

/// Exporter options that can come from a config file.
///
/// The app handle, registry and skip predicates are not serializable and are
/// attached through [`crate::PluginOptions`] instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSettings {
    #[serde(default = "default_true")]
    pub metrics_endpoint: bool,

    #[serde(default = "default_metrics_endpoint_path")]
    pub metrics_endpoint_path: String,

    /// Register the process collector (cpu, memory, fds, start time).
    #[serde(default = "default_true")]
    pub default_metrics: bool,

    /// Namespace for process collector metrics.
    #[serde(default)]
    pub default_metrics_prefix: Option<String>,

    /// Constant labels attached to every exporter metric.
    #[serde(default)]
    pub default_labels: BTreeMap<String, String>,

    #[serde(default = "default_true")]
    pub hostname_label: bool,

    #[serde(default = "default_hostname_label_name")]
    pub hostname_label_name: String,

    #[serde(default)]
    pub disabled_metrics: Vec<MetricName>,

    /// Label names read from the application context on each request.
    #[serde(default)]
    pub custom_labels: Vec<String>,

    #[serde(default = "default_duration_buckets")]
    pub duration_histogram_buckets: Vec<f64>,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            metrics_endpoint: true,
            metrics_endpoint_path: default_metrics_endpoint_path(),
            default_metrics: true,
            default_metrics_prefix: None,
            default_labels: BTreeMap::new(),
            hostname_label: true,
            hostname_label_name: default_hostname_label_name(),
            disabled_metrics: Vec::new(),
            custom_labels: Vec::new(),
            duration_histogram_buckets: default_duration_buckets(),
        }
    }
}

impl ExporterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.metrics_endpoint && !is_static_route(&self.metrics_endpoint_path) {
            return Err(GqlPromError::BadOption(format!(
                "malformed metrics_endpoint_path: {:?}",
                self.metrics_endpoint_path
            )));
        }

        if let Some(prefix) = &self.default_metrics_prefix {
            if !is_valid_metric_prefix(prefix) {
                return Err(GqlPromError::BadOption(format!(
                    "malformed default_metrics_prefix: {prefix}"
                )));
            }
        }

        for name in self.default_labels.keys() {
            check_label_name(name)?;
        }

        if self.hostname_label {
            if self.hostname_label_name.is_empty() {
                return Err(GqlPromError::BadOption("malformed hostname_label_name".into()));
            }
            check_label_name(&self.hostname_label_name)?;
            if self.default_labels.contains_key(&self.hostname_label_name) {
                return Err(GqlPromError::LabelCollision {
                    label: self.hostname_label_name.clone(),
                    reason: "hostname_label_name is already defined in default_labels",
                });
            }
        }

        let mut seen = BTreeSet::new();
        for label in &self.custom_labels {
            check_label_name(label)?;
            if RESERVED_LABEL_NAMES.contains(&label.as_str()) {
                return Err(GqlPromError::LabelCollision {
                    label: label.clone(),
                    reason: "custom label shadows a built-in label",
                });
            }
            if self.default_labels.contains_key(label)
                || (self.hostname_label && *label == self.hostname_label_name)
            {
                return Err(GqlPromError::LabelCollision {
                    label: label.clone(),
                    reason: "custom label is already a default label",
                });
            }
            if !seen.insert(label.as_str()) {
                return Err(GqlPromError::LabelCollision {
                    label: label.clone(),
                    reason: "custom label listed twice",
                });
            }
        }

        for name in self.default_labels.keys() {
            if RESERVED_LABEL_NAMES.contains(&name.as_str()) {
                return Err(GqlPromError::LabelCollision {
                    label: name.clone(),
                    reason: "default label shadows a built-in label",
                });
            }
        }

        let buckets = &self.duration_histogram_buckets;
        if buckets.is_empty() {
            return Err(GqlPromError::BadOption(
                "duration_histogram_buckets must not be empty".into(),
            ));
        }
        if buckets.windows(2).any(|w| w[0] >= w[1]) || buckets.iter().any(|b| !b.is_finite()) {
            return Err(GqlPromError::BadOption(
                "duration_histogram_buckets must be finite and strictly increasing".into(),
            ));
        }

        Ok(())
    }
}

fn check_label_name(name: &str) -> Result<()> {
    if is_valid_label_name(name) {
        Ok(())
    } else {
        Err(GqlPromError::BadOption(format!("invalid label name: {name:?}")))
    }
}

/// A literal axum route: leading '/', non-empty segments, no captures or
/// wildcards.
pub fn is_static_route(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    rest.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| !matches!(c, '*' | ':' | '{' | '}' | '?' | '#') && !c.is_whitespace())
    })
}

fn is_valid_metric_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn default_true() -> bool {
    true
}
fn default_metrics_endpoint_path() -> String {
    "/metrics".into()
}
fn default_hostname_label_name() -> String {
    "hostname".into()
}
fn default_duration_buckets() -> Vec<f64> {
    DEFAULT_DURATION_BUCKETS.to_vec()
}
