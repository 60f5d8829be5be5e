//! Expense categorization endpoint

use axum::extract::State;
use serde::Deserialize;

use crate::api::middleware::ClientKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::categorization::ExpenseCategory;

#[derive(Debug, Clone, Deserialize)]
pub struct CategorizeRequest {
    pub descricao: String,
}

/// POST /v1/categorize
///
/// Charges one unit of the caller's quota once the ledger admits the key.
pub async fn categorize_expense(
    State(state): State<AppState>,
    key: ClientKey,
    Json(request): Json<CategorizeRequest>,
) -> Result<Json<ExpenseCategory>, ApiError> {
    let category = state
        .categorizer
        .categorize(key.as_str(), &request.descricao)
        .await?;

    Ok(Json(category))
}
