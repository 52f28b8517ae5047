//! gqlprom core: engine-agnostic metric catalog, label derivation and skip policy.
//!
//! This crate defines how GraphQL lifecycle events map onto Prometheus-style
//! series: which metrics exist, which labels each one carries, how label
//! values are derived from request/field context, and when an observation is
//! skipped. It carries no GraphQL engine, registry, or HTTP dependencies so
//! the mapping can be tested in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `GqlPromError`/`Result` so a bad label or
//! option never crashes the host server.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod labels;
pub mod metric;
pub mod skip;

/// Shared result type.
pub use error::{ErrorCode, GqlPromError, Result};
pub use labels::{AppLabels, FieldInfo, LabelSet, LabelSource};
pub use metric::{MetricKind, MetricName};
pub use skip::{SkipPolicy, SkipPredicate};
