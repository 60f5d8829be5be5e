//! Prometheus metrics

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;
use crate::domain::ledger::{Authorization, EnforcementMode};

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .unwrap_or_else(|e| panic!("invalid uuid pattern: {e}"))
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/\d+(/|$)").unwrap_or_else(|e| panic!("invalid numeric pattern: {e}"))
});

const MAX_PATH_LABEL_LEN: usize = 50;

/// Handle for rendering the Prometheus exposition
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global Prometheus recorder.
///
/// Returns None when metrics are disabled or a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("contabil_api_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!(path = %config.path, "Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Prometheus metrics");
            None
        }
    }
}

/// Router serving the exposition at the configured path
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Count one ledger decision (check or try_consume)
pub fn record_ledger_decision(mode: EnforcementMode, decision: Authorization) {
    counter!(
        "ledger_decisions_total",
        "mode" => mode.as_str(),
        "decision" => decision.as_str()
    )
    .increment(1);
}

/// Count one unit written to the ledger.
///
/// `matched` is false when the key did not exist and the write was a no-op.
pub fn record_usage_recorded(matched: bool) {
    let outcome = if matched { "recorded" } else { "unknown_key" };
    counter!("ledger_usage_recorded_total", "outcome" => outcome).increment(1);
}

/// Count one categorization call and its latency
pub fn record_categorization(outcome: &'static str, duration: Duration) {
    counter!("categorization_requests_total", "outcome" => outcome).increment(1);
    histogram!("categorization_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());
}

/// Count one upstream model call
pub fn record_llm_request(provider: &str, model: &str, success: bool, duration: Duration) {
    let labels = [
        ("provider", provider.to_string()),
        ("model", model.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);
    histogram!("llm_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Collapse ids in a path to keep label cardinality bounded
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/{id}$1");

    path.chars().take(MAX_PATH_LABEL_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_uuid() {
        let path = "/admin/clients/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(sanitize_path(path), "/admin/clients/{id}");
    }

    #[test]
    fn test_sanitize_path_numeric_id() {
        assert_eq!(sanitize_path("/v1/items/123/notes"), "/v1/items/{id}/notes");
    }

    #[test]
    fn test_sanitize_path_static() {
        assert_eq!(sanitize_path("/v1/categorize"), "/v1/categorize");
    }

    #[test]
    fn test_sanitize_path_truncates() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert_eq!(sanitize_path(path).len(), MAX_PATH_LABEL_LEN);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_ledger_decision(EnforcementMode::Strict, Authorization::QuotaExceeded);
        record_usage_recorded(false);
        record_categorization("ok", Duration::from_millis(5));
    }
}
