//! Client key extraction

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::api::types::ApiError;
use crate::domain::client::ClientApiKey;

/// The API key presented by the caller.
///
/// Extraction only checks that a key is present; whether the ledger knows
/// it is decided by the handler.
///
/// Read from either:
/// - Authorization header: `Bearer <api_key>`
/// - X-API-Key header: `<api_key>`
#[derive(Debug, Clone)]
pub struct ClientKey(pub ClientApiKey);

impl ClientKey {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_api_key_from_headers(&parts.headers).map(|key| ClientKey(ClientApiKey::new(key)))
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

    Ok(value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string))
}

fn extract_api_key_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(token) = bearer_token(headers)? {
        return Ok(token);
    }

    if let Some(value) = headers.get("x-api-key") {
        let key = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?
            .trim();

        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    Err(ApiError::unauthorized(
        "API key required. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header",
    ))
}
