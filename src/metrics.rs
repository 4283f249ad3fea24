//! Prometheus metrics, exposed at `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    HistogramVec, IntCounterVec, register_histogram_vec, register_int_counter_vec,
};
use tracing::error;

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gateway_http_requests_total",
        "Total HTTP requests handled by the gateway",
        &["method", "path", "status"]
    )
    .expect("metric can be registered")
});

pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "gateway_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"]
    )
    .expect("metric can be registered")
});

pub static CACHE_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gateway_cache_requests_total",
        "Cache lookups by outcome",
        &["outcome"]
    )
    .expect("metric can be registered")
});

pub fn record_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn record_cache(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    CACHE_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Renders the default registry in Prometheus text format.
pub fn gather_metrics() -> String {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
