use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all roles server metrics
const PREFIX: &str = "scouting_roles";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Query Metrics
    pub static ref ROLE_QUERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_role_queries_total"), "Role lookups by outcome"),
        &["cohort", "outcome"]
    ).expect("Failed to create role_queries_total metric");

    pub static ref SIMILAR_QUERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_similar_queries_total"), "Similarity lookups by outcome"),
        &["cohort", "outcome"]
    ).expect("Failed to create similar_queries_total metric");

    pub static ref SIMILAR_RESULTS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_similar_results"),
            "Number of neighbors returned per similarity lookup"
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0]),
        &["cohort"]
    ).expect("Failed to create similar_results metric");

    // Artifact Metrics
    pub static ref DATA_INTEGRITY_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_data_integrity_errors_total"),
            "Artifact integrity failures surfaced to callers"
        ),
        &["cohort", "kind"]
    ).expect("Failed to create data_integrity_errors_total metric");

    pub static ref LOADED_SEASONS: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_loaded_seasons"), "Season loads performed per cohort"),
        &["cohort"]
    ).expect("Failed to create loaded_seasons metric");
}

/// Initialize all metrics by registering them with the global registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ROLE_QUERIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SIMILAR_QUERIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SIMILAR_RESULTS.clone()));
    let _ = REGISTRY.register(Box::new(DATA_INTEGRITY_ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(LOADED_SEASONS.clone()));
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_role_query(cohort: &str, outcome: &str) {
    ROLE_QUERIES_TOTAL
        .with_label_values(&[cohort, outcome])
        .inc();
}

pub fn record_similar_query(cohort: &str, outcome: &str, results: usize) {
    SIMILAR_QUERIES_TOTAL
        .with_label_values(&[cohort, outcome])
        .inc();
    SIMILAR_RESULTS
        .with_label_values(&[cohort])
        .observe(results as f64);
}

pub fn record_integrity_error(cohort: &str, kind: &str) {
    DATA_INTEGRITY_ERRORS_TOTAL
        .with_label_values(&[cohort, kind])
        .inc();
}

pub fn set_loaded_seasons(cohort: &str, count: usize) {
    LOADED_SEASONS
        .with_label_values(&[cohort])
        .set(count as f64);
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_metric(name: &str) -> bool {
        REGISTRY.gather().iter().any(|m| m.get_name() == name)
    }

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        assert!(!REGISTRY.gather().is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_http_request() {
        init_metrics();

        record_http_request("GET", "/v1/cohorts", 200, Duration::from_millis(5));

        assert!(has_metric("scouting_roles_http_requests_total"));
        assert!(has_metric("scouting_roles_http_request_duration_seconds"));
    }

    #[test]
    fn test_record_queries() {
        init_metrics();

        record_role_query("test_cohort", "found");
        record_similar_query("test_cohort", "found", 3);

        assert!(
            ROLE_QUERIES_TOTAL
                .with_label_values(&["test_cohort", "found"])
                .get()
                >= 1.0
        );
        assert!(has_metric("scouting_roles_similar_results"));
    }

    #[test]
    fn test_integrity_errors_and_seasons() {
        init_metrics();

        record_integrity_error("test_cohort", "unmapped_cluster");
        set_loaded_seasons("test_cohort", 4);

        assert!(
            DATA_INTEGRITY_ERRORS_TOTAL
                .with_label_values(&["test_cohort", "unmapped_cluster"])
                .get()
                >= 1.0
        );
        assert_eq!(LOADED_SEASONS.with_label_values(&["test_cohort"]).get(), 4.0);
    }
}
