//! Liveness and readiness endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
}

/// `{"status": "ok"}` for uptime monitors
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { status: "ok" })
}

pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION"),
        checks: None,
    };

    (StatusCode::OK, Json(response))
}

/// Ready once the ledger store answers a count query
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = check_ledger(&state).await;
    let status = ledger.status;

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks: Some(vec![ledger]),
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_ledger(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let result = state.ledger.count_clients().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(clients) => {
            tracing::debug!(clients, "Readiness check passed");
            HealthCheck {
                name: "ledger",
                status: HealthStatus::Healthy,
                message: None,
                latency_ms,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HealthCheck {
                name: "ledger",
                status: HealthStatus::Unhealthy,
                message: Some("ledger storage unavailable".to_string()),
                latency_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0",
            checks: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json.get("checks").is_none());
    }

    #[test]
    fn test_failed_check_serialization() {
        let check = HealthCheck {
            name: "ledger",
            status: HealthStatus::Unhealthy,
            message: Some("ledger storage unavailable".to_string()),
            latency_ms: 3,
        };

        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["name"], "ledger");
    }
}
