//! Plugin factory.
//!
//! `create_plugin` validates options, mounts the metrics endpoint on the host
//! app, prepares the registry (process collector, constant labels) and
//! registers the lifecycle instruments. The returned [`Plugin`] hands out the
//! async-graphql extension and the server lifecycle hooks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use prometheus::Registry;

use gqlprom_core::error::Result;
use gqlprom_core::labels::server_labels;
use gqlprom_core::{LabelSource, MetricName};

use crate::config::ExporterSettings;
use crate::dispatch::{MetricDispatcher, Observation};
use crate::extension::PrometheusExtension;
use crate::obs::{generate_metrics, toggle_default_metrics};
use crate::ops;
use crate::options::{generate_context, PluginOptions};

pub fn create_plugin<S>(options: PluginOptions<S>) -> Result<Plugin<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let ctx = generate_context(options)?;

    // Mount first: a rejected route must not leave collectors in a shared registry.
    let app = toggle_endpoint(ctx.app, &ctx.registry, &ctx.settings)?;
    toggle_default_metrics(&ctx.registry, &ctx.settings)?;
    let metrics = generate_metrics(&ctx.registry, &ctx.settings, &ctx.instrument_labels, &ctx.skip)?;

    log_setup(&ctx.settings, &ctx.const_labels);

    let dispatcher = Arc::new(MetricDispatcher::new(metrics, ctx.skip));
    Ok(Plugin {
        lifecycle: ServerLifecycle {
            dispatcher: Arc::clone(&dispatcher),
            version: ctx.server_version.map(Arc::from),
            draining: Arc::new(AtomicBool::new(false)),
        },
        dispatcher,
        custom_labels: Arc::new(ctx.settings.custom_labels),
        registry: ctx.registry,
        app,
    })
}

fn toggle_endpoint<S>(
    app: Option<Router<S>>,
    registry: &Registry,
    settings: &ExporterSettings,
) -> Result<Option<Router<S>>>
where
    S: Clone + Send + Sync + 'static,
{
    match app {
        Some(app) if settings.metrics_endpoint => {
            ops::register_endpoint(app, registry.clone(), &settings.metrics_endpoint_path).map(Some)
        }
        other => Ok(other),
    }
}

fn log_setup(settings: &ExporterSettings, const_labels: &HashMap<String, String>) {
    tracing::info!(
        endpoint = ?settings.metrics_endpoint.then_some(settings.metrics_endpoint_path.as_str()),
        default_metrics = settings.default_metrics,
        custom_labels = ?settings.custom_labels,
        disabled = ?settings.disabled_metrics,
        const_labels = ?const_labels,
        "graphql metrics exporter ready"
    );
}

pub struct Plugin<S = ()> {
    dispatcher: Arc<MetricDispatcher>,
    custom_labels: Arc<Vec<String>>,
    registry: Registry,
    app: Option<Router<S>>,
    lifecycle: ServerLifecycle,
}

impl<S> Plugin<S> {
    /// Extension to install on the schema; `C` is the context type custom
    /// labels are read from.
    pub fn extension<C: LabelSource + Clone + 'static>(&self) -> PrometheusExtension<C> {
        PrometheusExtension::new(Arc::clone(&self.dispatcher), Arc::clone(&self.custom_labels))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &MetricDispatcher {
        &self.dispatcher
    }

    /// Host app with the metrics route mounted.
    pub fn app(&self) -> Option<&Router<S>> {
        self.app.as_ref()
    }

    pub fn take_app(&mut self) -> Option<Router<S>> {
        self.app.take()
    }

    pub fn lifecycle(&self) -> ServerLifecycle {
        self.lifecycle.clone()
    }

    pub fn server_will_start(&self) {
        self.lifecycle.server_will_start();
    }

    pub fn server_will_stop(&self) {
        self.lifecycle.server_will_stop();
    }

    pub fn is_draining(&self) -> bool {
        self.lifecycle.is_draining()
    }
}

/// Server start/stop hooks. The GraphQL engine has no such hooks, so the host
/// calls these around its serve loop.
#[derive(Clone)]
pub struct ServerLifecycle {
    dispatcher: Arc<MetricDispatcher>,
    version: Option<Arc<str>>,
    draining: Arc<AtomicBool>,
}

impl ServerLifecycle {
    pub fn server_will_start(&self) {
        tracing::info!(version = ?self.version, "graphql server starting");
        self.mark(MetricName::ServerStarting);
    }

    pub fn server_will_stop(&self) {
        self.draining.store(true, Ordering::Relaxed);
        tracing::info!(version = ?self.version, "graphql server closing");
        self.mark(MetricName::ServerClosing);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    fn mark(&self, metric: MetricName) {
        let labels = server_labels(self.version.as_deref());
        self.dispatcher
            .action(Observation::new(metric, labels).value_ms(now_ms()));
    }
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
