//! Request gates. Each one either lets the request continue (possibly with
//! more context attached) or answers it directly. Routers apply them with
//! `route_layer`, auth gate outermost.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::extractors::{bearer_token, Principal};
use crate::{error::ApiError, state::AppState, users::model::Role};

const INVALID_TOKEN: &str = "Invalid or expired token";

/// Verifies the bearer token, resolves its subject with one directory
/// lookup and attaches the [`Principal`].
pub async fn auth_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Access token is required".into()))?;

    let user_id = state.jwt.verify(token).map_err(|reason| {
        warn!(%reason, "bearer token rejected");
        ApiError::Unauthorized(INVALID_TOKEN.into())
    })?;

    let account = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(ApiError::storage("Internal server error"))?
        .ok_or_else(|| {
            // same answer as a bad token; the caller can't tell the cases apart
            warn!(%user_id, "token subject no longer exists");
            ApiError::Unauthorized(INVALID_TOKEN.into())
        })?;

    debug!(%user_id, role = %account.role, "request authenticated");
    req.extensions_mut().insert(Principal::from(&account));
    Ok(next.run(req).await)
}

fn check_role(principal: Option<&Principal>, required: Role) -> Result<(), ApiError> {
    let principal =
        principal.ok_or_else(|| ApiError::Unauthorized("User not authenticated".into()))?;
    if !principal.role.satisfies(required) {
        warn!(user_id = %principal.id, email = %principal.email, %required, "role check failed");
        return Err(ApiError::Forbidden(
            "Permission denied: Administrator access required".into(),
        ));
    }
    Ok(())
}

/// Must run after [`auth_gate`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    check_role(req.extensions().get::<Principal>(), Role::Admin)?;
    Ok(next.run(req).await)
}
