use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{
    logging_middleware, metrics_middleware, security_headers_middleware, MAX_BODY_SIZE,
};
use super::state::AppState;
use super::types::ApiError;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Full HTTP surface. The metrics endpoint is mounted when a recorder
/// handle is passed.
pub fn create_router(state: AppState, metrics: Option<(PrometheusMetrics, String)>) -> Router {
    let mut router = Router::new()
        .route("/ping", get(health::ping))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .nest("/admin", admin::create_admin_router())
        .fallback(route_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if let Some((handle, path)) = metrics {
        router = router.merge(create_metrics_router(handle, &path));
    }

    router
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::CategorizationConfig;
    use crate::domain::client::{ClientAccount, ClientApiKey, MockClientAccountRepository};
    use crate::domain::DomainError;
    use crate::domain::ledger::EnforcementMode;
    use crate::domain::llm::MockLlmProvider;
    use crate::infrastructure::categorization::CategorizationService;
    use crate::infrastructure::client::InMemoryClientAccountRepository;
    use crate::infrastructure::ledger::{UsageLedger, UsageLedgerTrait};

    const ADMIN_TOKEN: &str = "admin-secret";

    struct Harness {
        router: Router,
        ledger: Arc<dyn UsageLedgerTrait>,
        provider: Arc<MockLlmProvider>,
    }

    fn harness(admin_token: Option<&str>) -> Harness {
        let repo = Arc::new(InMemoryClientAccountRepository::with_accounts(vec![
            ClientAccount::new(ClientApiKey::new("abc"), "Acme", 1000).with_usage_count(999),
            ClientAccount::new(ClientApiKey::new("def"), "Globex", 5),
        ]));
        let ledger: Arc<dyn UsageLedgerTrait> = Arc::new(UsageLedger::new(repo, 1000));
        let provider = Arc::new(MockLlmProvider::replying("Transporte"));
        let categorizer = Arc::new(CategorizationService::new(
            ledger.clone(),
            provider.clone(),
            CategorizationConfig::default(),
            EnforcementMode::Advisory,
        ));

        let state = AppState::new(ledger.clone(), categorizer)
            .with_admin_token(admin_token.map(str::to_string));

        Harness {
            router: create_router(state, None),
            ledger,
            provider,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn categorize(key: Option<&str>, descricao: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/categorize")
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder
            .body(Body::from(json!({"descricao": descricao}).to_string()))
            .unwrap()
    }

    fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let h = harness(None);
        let (status, body) = send(&h.router, get("/ping", &[])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_envelope() {
        let h = harness(None);
        let (status, body) = send(&h.router, get("/v1/chat/completions", &[])).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_ready_probes_ledger() {
        let h = harness(None);
        let (status, body) = send(&h.router, get("/ready", &[])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "ledger");
    }

    #[tokio::test]
    async fn test_ready_counts_instead_of_listing() {
        let mut repo = MockClientAccountRepository::new();
        repo.expect_count()
            .times(1)
            .returning(|| Err(DomainError::storage("connection refused")));
        repo.expect_list().never();

        let ledger: Arc<dyn UsageLedgerTrait> = Arc::new(UsageLedger::new(Arc::new(repo), 1000));
        let categorizer = Arc::new(CategorizationService::new(
            ledger.clone(),
            Arc::new(MockLlmProvider::replying("Transporte")),
            CategorizationConfig::default(),
            EnforcementMode::Advisory,
        ));
        let router = create_router(AppState::new(ledger, categorizer), None);

        let (status, body) = send(&router, get("/ready", &[])).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"][0]["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_last_unit_then_denied() {
        let h = harness(None);

        let (status, body) = send(&h.router, categorize(Some("abc"), "Uber")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"categoria": "Transporte"}));

        let (status, body) = send(&h.router, get("/v1/me", &[("x-api-key", "abc")])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"cliente": "Acme", "usos_realizados": 1000, "limite": 1000, "restante": 0})
        );

        let (status, _) = send(&h.router, categorize(Some("abc"), "Uber")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(h.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_401() {
        let h = harness(None);
        let (status, body) = send(&h.router, categorize(None, "Uber")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_unknown_and_exhausted_look_the_same() {
        let h = harness(None);
        for _ in 0..5 {
            h.ledger.record_usage("def").await.unwrap();
        }

        let (unknown_status, unknown) = send(&h.router, categorize(Some("zzz"), "Uber")).await;
        let (exhausted_status, exhausted) = send(&h.router, categorize(Some("def"), "Uber")).await;

        assert_eq!(unknown_status, StatusCode::FORBIDDEN);
        assert_eq!(exhausted_status, StatusCode::FORBIDDEN);
        assert_eq!(unknown, exhausted);
        assert_eq!(h.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_description_is_not_charged() {
        let h = harness(None);
        let (status, body) = send(&h.router, categorize(Some("def"), "  ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(h.ledger.describe("def").await.unwrap().unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn test_me_unknown_key_is_403() {
        let h = harness(None);
        let (status, _) = send(&h.router, get("/v1/me", &[("authorization", "Bearer nope")])).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_closed_without_token() {
        let h = harness(None);
        let (status, _) = send(
            &h.router,
            get("/admin/clients", &[("x-admin-token", "anything")]),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_token_checks() {
        let h = harness(Some(ADMIN_TOKEN));

        let (status, _) = send(&h.router, get("/admin/clients", &[])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &h.router,
            get("/admin/clients", &[("x-admin-token", "wrong")]),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // A client key is not an admin credential
        let (status, _) = send(&h.router, get("/admin/clients", &[("authorization", "Bearer abc")])).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_lists_all_clients() {
        let h = harness(Some(ADMIN_TOKEN));
        let bearer = format!("Bearer {}", ADMIN_TOKEN);

        let (status, body) = send(
            &h.router,
            get("/admin/clients", &[("authorization", bearer.as_str())]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        for client in body["data"].as_array().unwrap() {
            let limit = client["limite"].as_i64().unwrap();
            let used = client["usos_realizados"].as_i64().unwrap();
            assert_eq!(client["restante"].as_i64().unwrap(), limit - used);
        }
    }

    #[tokio::test]
    async fn test_security_and_request_id_headers() {
        let h = harness(None);
        let response = h.router.clone().oneshot(get("/health", &[])).await.unwrap();

        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().contains_key("x-request-id"));
    }
}
