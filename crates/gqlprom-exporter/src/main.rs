//! gqlprom demo server
//!
//! - GraphQL endpoint with the metrics extension installed
//! - Metrics endpoint mounted by the plugin (default `/metrics`)
//! - Server start/stop gauges around the serve loop

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use gqlprom_exporter::{config, plugin::ServerLifecycle, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("GQLPROM_CONFIG").unwrap_or_else(|_| "gqlprom.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let (app, lifecycle) = router::build_router(cfg).expect("plugin setup failed");

    tracing::info!(%listen, "gqlprom demo server starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    lifecycle.server_will_start();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(lifecycle))
        .await
        .expect("server failed");
}

async fn shutdown_signal(lifecycle: ServerLifecycle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed; stopping");
    }
    lifecycle.server_will_stop();
}
