//! Metric dispatch: skip policy first, then route by instrument kind.

pub mod dispatcher;

pub use dispatcher::{Dispatch, MetricDispatcher, Observation};
