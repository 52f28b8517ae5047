//! Skip/disable policy applied before any observation reaches an instrument.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::labels::{FieldInfo, LabelSet, LabelSource};
use crate::metric::MetricName;

/// Per-metric predicate deciding whether one observation is dropped.
///
/// `context` is the request's application context (absent for server
/// lifecycle metrics and requests that carry none); `field` is only set for
/// field resolution observations.
pub trait SkipPredicate: Send + Sync {
    fn skip(
        &self,
        labels: &LabelSet,
        context: Option<&dyn LabelSource>,
        field: Option<&FieldInfo>,
    ) -> bool;
}

impl<F> SkipPredicate for F
where
    F: Fn(&LabelSet, Option<&dyn LabelSource>, Option<&FieldInfo>) -> bool + Send + Sync,
{
    fn skip(
        &self,
        labels: &LabelSet,
        context: Option<&dyn LabelSource>,
        field: Option<&FieldInfo>,
    ) -> bool {
        self(labels, context, field)
    }
}

/// Disabled metrics plus optional per-metric predicates.
/// Built once at setup, then shared read-only.
#[derive(Clone, Default)]
pub struct SkipPolicy {
    disabled: BTreeSet<MetricName>,
    predicates: HashMap<MetricName, Arc<dyn SkipPredicate>>,
}

impl SkipPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable(&mut self, metric: MetricName) {
        self.disabled.insert(metric);
    }

    pub fn set_predicate(&mut self, metric: MetricName, predicate: Arc<dyn SkipPredicate>) {
        self.predicates.insert(metric, predicate);
    }

    /// Builder form of [`SkipPolicy::set_predicate`] for closures.
    pub fn with_predicate<F>(mut self, metric: MetricName, f: F) -> Self
    where
        F: Fn(&LabelSet, Option<&dyn LabelSource>, Option<&FieldInfo>) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.predicates.insert(metric, Arc::new(f));
        self
    }

    pub fn is_disabled(&self, metric: MetricName) -> bool {
        self.disabled.contains(&metric)
    }

    pub fn disabled(&self) -> impl Iterator<Item = MetricName> + '_ {
        self.disabled.iter().copied()
    }

    /// True when the metric is disabled or its predicate rejects the observation.
    pub fn should_skip(
        &self,
        metric: MetricName,
        labels: &LabelSet,
        context: Option<&dyn LabelSource>,
        field: Option<&FieldInfo>,
    ) -> bool {
        if self.is_disabled(metric) {
            return true;
        }
        match self.predicates.get(&metric) {
            Some(p) => p.skip(labels, context, field),
            None => false,
        }
    }
}

impl fmt::Debug for SkipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipPolicy")
            .field("disabled", &self.disabled)
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}
