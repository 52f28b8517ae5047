//! Operational HTTP endpoints.
//!
//! - `<metrics_endpoint_path>` : Prometheus text format (mounted on the host app)
//! - `/healthz` : liveness
//! - `/readyz`  : readiness (503 once the server is stopping)

use std::panic::{self, AssertUnwindSafe};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Registry, TextEncoder};

use gqlprom_core::error::{GqlPromError, Result};

use crate::app_state::AppState;

/// Mount `GET path` rendering `registry` on the host app.
///
/// The path must already have passed `ExporterSettings::validate`. A route
/// conflict with the host app makes axum panic; it surfaces as `BadOption`.
pub fn register_endpoint<S>(app: Router<S>, registry: Registry, path: &str) -> Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let handler = get(move || {
        let registry = registry.clone();
        async move { render(&registry) }
    });

    panic::catch_unwind(AssertUnwindSafe(|| app.route(path, handler))).map_err(|_| {
        GqlPromError::BadOption(format!(
            "metrics_endpoint_path {path} conflicts with an existing route"
        ))
    })
}

/// Encode the registry in the text exposition format.
pub fn render(registry: &Registry) -> Response {
    let families = registry.gather();
    match TextEncoder::new().encode_to_string(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.lifecycle().is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "ready")
    }
}
