use std::fmt;

use gqlprom_core::labels::convert_ms_to_s;
use gqlprom_core::{FieldInfo, LabelSet, LabelSource, MetricName, SkipPolicy};

use crate::obs::{Instrument, Metrics};

/// One lifecycle measurement on its way to an instrument.
#[derive(Clone)]
pub struct Observation<'a> {
    pub metric: MetricName,
    pub labels: LabelSet,
    /// Milliseconds (durations) or unix-epoch milliseconds (server gauges).
    /// Counters ignore it.
    pub value_ms: Option<f64>,
    pub field: Option<&'a FieldInfo>,
    /// Application context handed to skip predicates.
    pub context: Option<&'a dyn LabelSource>,
}

impl<'a> Observation<'a> {
    pub fn new(metric: MetricName, labels: LabelSet) -> Self {
        Self {
            metric,
            labels,
            value_ms: None,
            field: None,
            context: None,
        }
    }

    pub fn value_ms(mut self, ms: f64) -> Self {
        self.value_ms = Some(ms);
        self
    }

    pub fn field(mut self, field: &'a FieldInfo) -> Self {
        self.field = Some(field);
        self
    }

    pub fn context(mut self, context: Option<&'a dyn LabelSource>) -> Self {
        self.context = context;
        self
    }
}

impl fmt::Debug for Observation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("metric", &self.metric)
            .field("labels", &self.labels)
            .field("value_ms", &self.value_ms)
            .field("field", &self.field)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

/// Outcome of [`MetricDispatcher::action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Recorded,
    Skipped,
    /// Instrument rejected the observation (bad cardinality, missing value).
    Dropped,
}

/// Routes observations to counters, gauges and histograms after applying the
/// skip policy. Immutable after construction; share via `Arc`.
pub struct MetricDispatcher {
    metrics: Metrics,
    skip: SkipPolicy,
}

impl MetricDispatcher {
    pub fn new(metrics: Metrics, skip: SkipPolicy) -> Self {
        Self { metrics, skip }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn action(&self, obs: Observation<'_>) -> Dispatch {
        let metric = obs.metric;
        if self.skip.should_skip(metric, &obs.labels, obs.context, obs.field) {
            tracing::trace!(%metric, "observation skipped");
            return Dispatch::Skipped;
        }

        let Some(slot) = self.metrics.get(metric) else {
            return Dispatch::Skipped;
        };
        let Some(instrument) = &slot.instrument else {
            return Dispatch::Skipped;
        };

        let values = obs.labels.values_for(&slot.label_names);
        let values = values.as_slice();

        let res = match instrument {
            Instrument::Counter(c) => c.get_metric_with_label_values(values).map(|c| c.inc()),
            Instrument::Gauge(g) => {
                let Some(ms) = obs.value_ms else {
                    tracing::warn!(%metric, "gauge observation without value");
                    return Dispatch::Dropped;
                };
                g.get_metric_with_label_values(values)
                    .map(|g| g.set(convert_ms_to_s(ms)))
            }
            Instrument::Histogram(h) => {
                let Some(ms) = obs.value_ms else {
                    tracing::warn!(%metric, "histogram observation without value");
                    return Dispatch::Dropped;
                };
                h.get_metric_with_label_values(values)
                    .map(|h| h.observe(convert_ms_to_s(ms)))
            }
        };

        match res {
            Ok(()) => Dispatch::Recorded,
            Err(e) => {
                tracing::warn!(%metric, error = %e, "metric update rejected");
                Dispatch::Dropped
            }
        }
    }
}
