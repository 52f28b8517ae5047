//! Label model and label derivation.
//!
//! Labels are kept in a `BTreeMap` so iteration order (and therefore any
//! rendering of a set) is deterministic. Absent values are never stored; when
//! an instrument asks for a label the set does not carry, the empty string is
//! supplied, which Prometheus treats the same as a missing label.

use std::collections::{BTreeMap, HashMap};

use crate::metric::{
    LABEL_FIELD_NAME, LABEL_OPERATION, LABEL_OPERATION_NAME, LABEL_PARENT_TYPE,
    LABEL_PATH_LENGTH, LABEL_RETURN_TYPE, LABEL_VERSION,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label; `None` values are dropped.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(v) = value {
            self.0.insert(name.into(), v.into());
        }
    }

    /// Builder form of [`LabelSet::insert`].
    pub fn with(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn merge(mut self, other: &LabelSet) -> Self {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
        self
    }

    /// Values in instrument order. Missing labels become `""`.
    pub fn values_for<'a>(&'a self, names: &[String]) -> Vec<&'a str> {
        names
            .iter()
            .map(|n| self.0.get(n).map(String::as_str).unwrap_or(""))
            .collect()
    }
}

/// Field-level context captured when a resolver runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub field_name: String,
    pub parent_type: String,
    /// Number of path segments from this field up to the root (inclusive).
    pub path_length: usize,
    pub return_type: String,
}

/// Application context that can supply values for configured custom labels.
///
/// The host's request context is only partially typed from the exporter's
/// point of view: it just needs to answer "what is the value of label X".
pub trait LabelSource: Send + Sync {
    fn label_value(&self, name: &str) -> Option<String>;
}

impl LabelSource for HashMap<String, String> {
    fn label_value(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl LabelSource for BTreeMap<String, String> {
    fn label_value(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl LabelSource for serde_json::Map<String, serde_json::Value> {
    fn label_value(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl LabelSource for serde_json::Value {
    fn label_value(&self, name: &str) -> Option<String> {
        self.as_object()?.label_value(name)
    }
}

/// Ready-made label source for hosts that do not have a context type of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppLabels(BTreeMap<String, String>);

impl AppLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }
}

impl LabelSource for AppLabels {
    fn label_value(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// `operationName` / `operation` labels for query metrics.
pub fn request_labels(operation_name: Option<&str>, operation: Option<&str>) -> LabelSet {
    LabelSet::new()
        .with(LABEL_OPERATION_NAME, operation_name)
        .with(LABEL_OPERATION, operation)
}

/// Values for the configured custom labels, read from the application context.
pub fn custom_labels(context: Option<&dyn LabelSource>, names: &[String]) -> LabelSet {
    let mut out = LabelSet::new();
    let Some(ctx) = context else {
        return out;
    };
    for name in names {
        out.insert(name.as_str(), ctx.label_value(name));
    }
    out
}

pub fn field_labels(field: &FieldInfo) -> LabelSet {
    LabelSet::new()
        .with(LABEL_FIELD_NAME, Some(field.field_name.as_str()))
        .with(LABEL_PARENT_TYPE, Some(field.parent_type.as_str()))
        .with(LABEL_PATH_LENGTH, Some(field.path_length.to_string()))
        .with(LABEL_RETURN_TYPE, Some(field.return_type.as_str()))
}

pub fn server_labels(version: Option<&str>) -> LabelSet {
    LabelSet::new().with(LABEL_VERSION, version)
}

/// Count path nodes from `node` up to the root, inclusive.
pub fn count_field_ancestors<'a, T>(
    mut node: Option<&'a T>,
    parent: impl Fn(&'a T) -> Option<&'a T>,
) -> usize {
    let mut count = 0;
    while let Some(n) = node {
        count += 1;
        node = parent(n);
    }
    count
}

pub fn convert_ms_to_s(ms: f64) -> f64 {
    ms / 1000.0
}
