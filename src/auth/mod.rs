use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;

/// Registration and login are public; the rest need a bearer token.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    let protected = Router::new()
        .route("/auth/me", get(handlers::get_me))
        .route("/auth/password", patch(handlers::change_password))
        .route_layer(from_fn_with_state(state, middleware::auth_gate));

    public.merge(protected)
}
