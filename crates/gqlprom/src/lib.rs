//! Top-level facade crate for gqlprom.
//!
//! Re-exports the core label/metric primitives and the exporter plugin so users
//! can depend on a single crate.

pub mod core {
    pub use gqlprom_core::*;
}

pub mod exporter {
    pub use gqlprom_exporter::*;
}

pub use gqlprom_exporter::{create_plugin, Plugin, PluginOptions, PrometheusExtension};
