//! Admin token authentication

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::auth::bearer_token;
use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Extractor guarding the admin API.
///
/// The token comes from `X-Admin-Token` or `Authorization: Bearer`. When no
/// admin token is configured every request is refused.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(ApiError::forbidden("Admin API is disabled"));
        };

        let presented = match parts.headers.get("x-admin-token") {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| ApiError::bad_request("Invalid X-Admin-Token header encoding"))?
                    .trim()
                    .to_string(),
            ),
            None => bearer_token(&parts.headers)?,
        };

        let Some(presented) = presented else {
            return Err(ApiError::unauthorized("Admin token required"));
        };

        if !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            warn!("Rejected admin request with invalid token");
            return Err(ApiError::forbidden("Invalid admin token"));
        }

        Ok(RequireAdmin)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
