//! Plugin options and their validation.

use std::collections::HashMap;

use axum::Router;
use prometheus::Registry;

use gqlprom_core::error::{GqlPromError, Result};
use gqlprom_core::{FieldInfo, LabelSet, LabelSource, MetricName, SkipPolicy};

use crate::config::ExporterSettings;

/// Everything `create_plugin` accepts.
///
/// `S` is the state type of the host's axum router; the metrics route does not
/// use it.
pub struct PluginOptions<S = ()> {
    pub app: Option<Router<S>>,
    pub settings: ExporterSettings,
    /// Registry to register into. A fresh one is created when absent.
    ///
    /// A fresh registry carries the default and hostname labels itself, so
    /// every series it exposes gets them (process metrics included). A
    /// supplied registry is left untouched; those labels are then attached as
    /// constant labels to the exporter's own metrics only.
    pub registry: Option<Registry>,
    pub skip: SkipPolicy,
    /// `version` label of the server lifecycle gauges.
    pub server_version: Option<String>,
}

impl<S> Default for PluginOptions<S> {
    fn default() -> Self {
        Self {
            app: None,
            settings: ExporterSettings::default(),
            registry: None,
            skip: SkipPolicy::new(),
            server_version: Some(concat!("v", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl<S> PluginOptions<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(mut self, app: Router<S>) -> Self {
        self.app = Some(app);
        self
    }

    pub fn settings(mut self, settings: ExporterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = Some(version.into());
        self
    }

    /// Drop observations of `metric` for which `f` returns true.
    pub fn skip_metric<F>(mut self, metric: MetricName, f: F) -> Self
    where
        F: Fn(&LabelSet, Option<&dyn LabelSource>, Option<&FieldInfo>) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.skip = self.skip.with_predicate(metric, f);
        self
    }
}

/// Validated options with defaults resolved.
pub struct ExporterContext<S = ()> {
    pub app: Option<Router<S>>,
    pub settings: ExporterSettings,
    pub registry: Registry,
    pub skip: SkipPolicy,
    pub server_version: Option<String>,
    /// `default_labels` plus the hostname label when enabled.
    pub const_labels: HashMap<String, String>,
    /// Constant labels the exporter's instruments must carry themselves; empty
    /// when the registry already applies `const_labels`.
    pub instrument_labels: HashMap<String, String>,
}

pub fn generate_context<S>(options: PluginOptions<S>) -> Result<ExporterContext<S>> {
    let PluginOptions {
        app,
        settings,
        registry,
        mut skip,
        server_version,
    } = options;

    if settings.metrics_endpoint && app.is_none() {
        return Err(GqlPromError::MissingApp);
    }
    settings.validate()?;

    for metric in &settings.disabled_metrics {
        skip.disable(*metric);
    }

    let const_labels = collect_const_labels(&settings);
    let (registry, instrument_labels) = match registry {
        Some(shared) => (shared, const_labels.clone()),
        None => (labelled_registry(&const_labels)?, HashMap::new()),
    };

    Ok(ExporterContext {
        app,
        settings,
        registry,
        skip,
        server_version,
        const_labels,
        instrument_labels,
    })
}

fn collect_const_labels(settings: &ExporterSettings) -> HashMap<String, String> {
    let mut labels: HashMap<String, String> = settings
        .default_labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if settings.hostname_label {
        labels.insert(settings.hostname_label_name.clone(), hostname());
    }
    labels
}

fn labelled_registry(labels: &HashMap<String, String>) -> Result<Registry> {
    let labels = (!labels.is_empty()).then(|| labels.clone());
    Registry::new_custom(None, labels)
        .map_err(|e| GqlPromError::Registry(format!("create registry failed: {e}")))
}

fn hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}
