//! Caller's own usage

use axum::extract::State;

use crate::api::middleware::ClientKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::client::ClientInfo;

/// GET /v1/me
///
/// Read-only and never charged; an exhausted key can still see its counters.
pub async fn describe_self(
    State(state): State<AppState>,
    key: ClientKey,
) -> Result<Json<ClientInfo>, ApiError> {
    state
        .ledger
        .describe(key.as_str())
        .await?
        .map(Json)
        .ok_or_else(ApiError::access_denied)
}
