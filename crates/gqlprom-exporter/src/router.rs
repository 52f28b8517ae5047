//! Axum router wiring for the demo server.
//!
//! Routes: `POST <graphql_path>`, `/healthz`, `/readyz`, plus the metrics
//! endpoint mounted by the plugin.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};

use gqlprom_core::error::{GqlPromError, Result};

use crate::app_state::AppState;
use crate::config::{ServerConfig, ServerSection};
use crate::ops;
use crate::options::PluginOptions;
use crate::plugin::{create_plugin, ServerLifecycle};

/// App routes before the plugin mounts the metrics endpoint.
pub fn base_router(server: &ServerSection) -> Router<AppState> {
    Router::new()
        .route(&server.graphql_path, post(graphql))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
}

/// Create the plugin over the base router and attach state.
pub fn build_router(cfg: ServerConfig) -> Result<(Router, ServerLifecycle)> {
    cfg.validate()?;
    let options = PluginOptions::new()
        .app(base_router(&cfg.server))
        .settings(cfg.exporter.clone());
    let mut plugin = create_plugin(options)?;

    let app = plugin
        .take_app()
        .ok_or_else(|| GqlPromError::Internal("plugin returned no app".into()))?;
    let lifecycle = plugin.lifecycle();
    let state = AppState::new(cfg, &plugin);

    Ok((app.with_state(state), lifecycle))
}

async fn graphql(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let labels = state.request_labels(&headers);
    Json(state.schema().execute(req.data(labels)).await)
}
