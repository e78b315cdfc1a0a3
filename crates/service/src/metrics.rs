use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec, IntCounter,
    IntCounterVec, TextEncoder,
};

use crate::errors::ServiceError;

// Prometheus metrics (default registry)
pub static PROBE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "admin_console_probe_duration_seconds",
        "Downstream probe duration in seconds",
        &["service"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register probe_duration")
});

pub static PROBE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "admin_console_probe_failures_total",
        "Probes that reported unhealthy",
        &["service"]
    )
    .expect("register probe_failures_total")
});

pub static BATCH_DELETED_TASKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "admin_console_batch_deleted_tasks_total",
        "Tasks removed through batch deletion"
    )
    .expect("register batch_deleted_tasks_total")
});

pub static HEALTH_REPORTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "admin_console_health_reports_total",
        "Health reports computed, by overall status",
        &["overall"]
    )
    .expect("register health_reports_total")
});

/// Touch every metric so they appear in the exposition before first use.
pub fn register_all() {
    Lazy::force(&PROBE_DURATION);
    Lazy::force(&PROBE_FAILURES_TOTAL);
    Lazy::force(&BATCH_DELETED_TASKS_TOTAL);
    Lazy::force(&HEALTH_REPORTS_TOTAL);
}

/// Render the default registry in the Prometheus text format.
pub fn encode() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ServiceError::Internal(format!("metrics encode error: {e}")))?;
    String::from_utf8(buffer).map_err(|e| ServiceError::Internal(format!("metrics encode error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposition_lists_registered_metrics() {
        register_all();
        BATCH_DELETED_TASKS_TOTAL.inc_by(0);
        let text = encode().unwrap();
        assert!(text.contains("admin_console_batch_deleted_tasks_total"));
    }
}
