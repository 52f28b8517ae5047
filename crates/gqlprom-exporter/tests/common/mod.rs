//! Shared helpers: build a quiet plugin and read samples back from the text format.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use prometheus::{Registry, TextEncoder};

use gqlprom_exporter::config::ExporterSettings;

/// Settings without endpoint, process collector or hostname label.
pub fn quiet_settings() -> ExporterSettings {
    ExporterSettings {
        metrics_endpoint: false,
        default_metrics: false,
        hostname_label: false,
        ..ExporterSettings::default()
    }
}

pub fn scrape(registry: &Registry) -> String {
    TextEncoder::new()
        .encode_to_string(&registry.gather())
        .expect("encode")
}

/// Value of the first series named `name` carrying every pair in `labels`.
pub fn sample(text: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (metric, label_str) = match series.split_once('{') {
                Some((m, rest)) => (m, rest.trim_end_matches('}')),
                None => (series, ""),
            };
            if metric != name {
                return None;
            }
            let pairs: Vec<(&str, &str)> = label_str
                .split(',')
                .filter(|s| !s.is_empty())
                .filter_map(|kv| {
                    let (k, v) = kv.split_once('=')?;
                    Some((k, v.trim_matches('"')))
                })
                .collect();
            if labels.iter().all(|want| pairs.contains(want)) {
                value.parse().ok()
            } else {
                None
            }
        })
}
