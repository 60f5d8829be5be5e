//! Operator endpoints, guarded by the admin token

pub mod clients;

use axum::{routing::get, Router};

use super::state::AppState;

pub fn create_admin_router() -> Router<AppState> {
    Router::new().route("/clients", get(clients::list_clients))
}
