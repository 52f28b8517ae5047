//! gqlprom exporter library entry.
//!
//! This crate wires option validation, instrument registration, metric
//! dispatch, the async-graphql lifecycle extension and the axum metrics
//! endpoint into a single plugin. It is consumed by host servers, by the demo
//! binary (`main.rs`) and by integration tests.
//!
//! ```no_run
//! use axum::Router;
//! use gqlprom_core::AppLabels;
//! use gqlprom_exporter::{create_plugin, PluginOptions};
//!
//! let plugin = create_plugin(PluginOptions::new().app(Router::<()>::new()))?;
//! let extension = plugin.extension::<AppLabels>();
//! # let _ = extension;
//! # Ok::<(), gqlprom_core::GqlPromError>(())
//! ```

pub mod app_state;
pub mod config;
pub mod demo;
pub mod dispatch;
pub mod extension;
pub mod obs;
pub mod ops;
pub mod options;
pub mod plugin;
pub mod router;

pub use extension::PrometheusExtension;
pub use options::PluginOptions;
pub use plugin::{create_plugin, Plugin, ServerLifecycle};
