//! Instrument generation on top of a `prometheus::Registry`.
//!
//! One slot exists per [`MetricName`]. Disabled metrics keep their slot (so the
//! dispatcher can tell "disabled" from "unknown") but are never registered and
//! carry no instrument.

use std::collections::HashMap;

use prometheus::{GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use gqlprom_core::error::{GqlPromError, Result};
use gqlprom_core::{MetricKind, MetricName, SkipPolicy};

use crate::config::ExporterSettings;

/// Registered instrument handle.
#[derive(Clone)]
pub enum Instrument {
    Gauge(GaugeVec),
    Counter(IntCounterVec),
    Histogram(HistogramVec),
}

#[derive(Clone)]
pub struct MetricSlot {
    pub kind: MetricKind,
    pub disabled: bool,
    /// Label names in the order the instrument expects values.
    pub label_names: Vec<String>,
    pub instrument: Option<Instrument>,
}

#[derive(Clone, Default)]
pub struct Metrics {
    slots: HashMap<MetricName, MetricSlot>,
}

impl Metrics {
    pub fn get(&self, name: MetricName) -> Option<&MetricSlot> {
        self.slots.get(&name)
    }

    pub fn is_enabled(&self, name: MetricName) -> bool {
        self.slots.get(&name).is_some_and(|s| s.instrument.is_some())
    }
}

/// Create and register every enabled metric.
pub fn generate_metrics(
    registry: &Registry,
    settings: &ExporterSettings,
    const_labels: &HashMap<String, String>,
    skip: &SkipPolicy,
) -> Result<Metrics> {
    let mut slots = HashMap::with_capacity(MetricName::ALL.len());

    for name in MetricName::ALL {
        let label_names = name.label_names(&settings.custom_labels);
        let disabled = skip.is_disabled(name);

        let instrument = if disabled {
            None
        } else {
            let inst = build_instrument(
                name,
                &label_names,
                const_labels,
                &settings.duration_histogram_buckets,
            )?;
            register(registry, name, &inst)?;
            Some(inst)
        };

        slots.insert(
            name,
            MetricSlot {
                kind: name.kind(),
                disabled,
                label_names,
                instrument,
            },
        );
    }

    Ok(Metrics { slots })
}

fn build_instrument(
    name: MetricName,
    label_names: &[String],
    const_labels: &HashMap<String, String>,
    buckets: &[f64],
) -> Result<Instrument> {
    let labels: Vec<&str> = label_names.iter().map(String::as_str).collect();
    let opts = Opts::new(name.as_str(), name.help()).const_labels(const_labels.clone());

    let inst = match name.kind() {
        MetricKind::Gauge => GaugeVec::new(opts, &labels).map(Instrument::Gauge),
        MetricKind::Counter => IntCounterVec::new(opts, &labels).map(Instrument::Counter),
        MetricKind::Histogram => {
            let hopts = HistogramOpts::from(opts).buckets(buckets.to_vec());
            HistogramVec::new(hopts, &labels).map(Instrument::Histogram)
        }
    };

    inst.map_err(|e| GqlPromError::Registry(format!("create {name} failed: {e}")))
}

fn register(registry: &Registry, name: MetricName, inst: &Instrument) -> Result<()> {
    let res = match inst {
        Instrument::Gauge(g) => registry.register(Box::new(g.clone())),
        Instrument::Counter(c) => registry.register(Box::new(c.clone())),
        Instrument::Histogram(h) => registry.register(Box::new(h.clone())),
    };
    res.map_err(|e| GqlPromError::Registry(format!("register {name} failed: {e}")))
}

/// Register the process collector when `default_metrics` is on.
pub fn toggle_default_metrics(registry: &Registry, settings: &ExporterSettings) -> Result<()> {
    if !settings.default_metrics {
        return Ok(());
    }
    register_process_collector(registry, settings.default_metrics_prefix.as_deref())
}

#[cfg(all(feature = "process", target_os = "linux"))]
fn register_process_collector(registry: &Registry, prefix: Option<&str>) -> Result<()> {
    use prometheus::process_collector::{pid_t, ProcessCollector};

    let pc = ProcessCollector::new(std::process::id() as pid_t, prefix.unwrap_or_default());
    registry
        .register(Box::new(pc))
        .map_err(|e| GqlPromError::Registry(format!("register process collector failed: {e}")))
}

#[cfg(not(all(feature = "process", target_os = "linux")))]
fn register_process_collector(_registry: &Registry, _prefix: Option<&str>) -> Result<()> {
    tracing::debug!("process collector unavailable on this target; default metrics skipped");
    Ok(())
}
