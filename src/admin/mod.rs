use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use crate::{
    auth::middleware::{auth_gate, require_admin},
    state::AppState,
};

pub mod handlers;

/// Role management and statistics. Auth gate runs first, then the admin check.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/:id/promote", patch(handlers::promote))
        .route("/admin/:id/demote", patch(handlers::demote))
        .route("/admin/stats", get(handlers::stats))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_gate))
}
