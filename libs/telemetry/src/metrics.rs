use crate::context::TelemetryLabels;
use metrics::Label;

fn labels_of(labels: &TelemetryLabels) -> Vec<Label> {
    labels
        .tags()
        .into_iter()
        .map(|(key, value)| Label::new(key, value))
        .collect()
}

/// Increments a counter through the global `metrics` recorder (a no-op when none is installed).
pub fn record_counter(name: &'static str, value: u64, labels: &TelemetryLabels) {
    metrics::counter!(name, labels_of(labels)).increment(value);
}

pub fn record_histogram(name: &'static str, value: f64, labels: &TelemetryLabels) {
    metrics::histogram!(name, labels_of(labels)).record(value);
}
