use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, Histogram,
    IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // Scheduler metrics
    pub static ref PASSES_TOTAL: IntCounter = register_int_counter!(
        "comparison_passes_total",
        "Total number of calculation passes run"
    ).unwrap();

    pub static ref PASSES_SKIPPED: IntCounter = register_int_counter!(
        "comparison_passes_skipped_total",
        "Ticks dropped because a pass was still running"
    ).unwrap();

    pub static ref CONFIG_FAILURES: IntCounterVec = register_int_counter_vec!(
        "comparison_config_failures_total",
        "Comparisons that failed within a pass",
        &["reason"]
    ).unwrap();

    // Backend metrics
    pub static ref QUERY_DURATION: Histogram = register_histogram!(
        "comparison_query_duration_seconds",
        "Backend range query duration in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();

    // State metrics
    pub static ref PUBLISHED_RESULTS: IntGauge = register_int_gauge!(
        "comparison_published_results",
        "Number of comparison results currently published"
    ).unwrap();

    pub static ref CONFIGURED_COMPARISONS: IntGauge = register_int_gauge!(
        "comparison_configured",
        "Number of configured comparisons"
    ).unwrap();
}

/// Observes a backend query's duration when dropped.
pub struct QueryTimer {
    start: Instant,
}

impl QueryTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for QueryTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        QUERY_DURATION.observe(self.start.elapsed().as_secs_f64());
    }
}

pub fn record_pass() {
    PASSES_TOTAL.inc();
}

pub fn record_skipped_pass() {
    PASSES_SKIPPED.inc();
}

pub fn record_config_failure(reason: &str) {
    CONFIG_FAILURES.with_label_values(&[reason]).inc();
}

pub fn set_published_results(count: usize) {
    PUBLISHED_RESULTS.set(count as i64);
}

pub fn set_configured_comparisons(count: usize) {
    CONFIGURED_COMPARISONS.set(count as i64);
}

/// Renders the process's own metrics in the Prometheus text format.
pub fn gather_text() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode self metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
