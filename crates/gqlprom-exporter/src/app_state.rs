//! Shared application state for the demo server.

use std::sync::Arc;

use axum::http::HeaderMap;

use gqlprom_core::AppLabels;

use crate::config::ServerConfig;
use crate::demo::{build_schema, DemoSchema};
use crate::plugin::{Plugin, ServerLifecycle};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    custom_labels: Vec<String>,
    schema: DemoSchema,
    lifecycle: ServerLifecycle,
}

impl AppState {
    pub fn new<S>(cfg: ServerConfig, plugin: &Plugin<S>) -> Self {
        let schema = build_schema(plugin.extension::<AppLabels>());
        Self {
            inner: Arc::new(AppStateInner {
                custom_labels: cfg.exporter.custom_labels,
                schema,
                lifecycle: plugin.lifecycle(),
            }),
        }
    }

    pub fn schema(&self) -> &DemoSchema {
        &self.inner.schema
    }

    pub fn lifecycle(&self) -> &ServerLifecycle {
        &self.inner.lifecycle
    }

    /// Custom label values for one request, taken from same-named headers.
    pub fn request_labels(&self, headers: &HeaderMap) -> AppLabels {
        let mut labels = AppLabels::new();
        for name in &self.inner.custom_labels {
            if let Some(v) = headers.get(name.as_str()).and_then(|v| v.to_str().ok()) {
                labels.insert(name.as_str(), v);
            }
        }
        labels
    }
}
