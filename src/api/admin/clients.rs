//! Client account listing

use axum::extract::State;
use serde::Serialize;
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::client::ClientInfo;

#[derive(Debug, Serialize)]
pub struct ClientListResponse {
    pub data: Vec<ClientInfo>,
    pub total: usize,
}

/// GET /admin/clients
pub async fn list_clients(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ClientListResponse>, ApiError> {
    let data = state.ledger.list_all().await?;
    debug!(count = data.len(), "Listed clients");

    Ok(Json(ClientListResponse {
        total: data.len(),
        data,
    }))
}
