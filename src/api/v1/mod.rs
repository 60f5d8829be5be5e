//! Client-facing v1 API

pub mod categorize;
pub mod me;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/categorize", post(categorize::categorize_expense))
        .route("/me", get(me::describe_self))
}
