//! Prometheus-backed instruments for the lifecycle metrics.
//!
//! Instruments are created once at plugin setup and registered into the
//! caller's (or a fresh) `prometheus::Registry`; the `/metrics` handler in
//! `ops` renders that registry.

pub mod metrics;

pub use metrics::{generate_metrics, toggle_default_metrics, Instrument, MetricSlot, Metrics};
