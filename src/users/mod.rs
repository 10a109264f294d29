use axum::{middleware, routing::get, Router};

use crate::{auth::middleware::auth_gate, state::AppState};

pub mod directory;
pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod model;
pub mod repo;
mod repo_types;
pub mod service;
pub mod validation;

/// Account CRUD. Every route needs a valid bearer token.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_gate))
}
