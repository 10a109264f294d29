use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    model::PublicAccount,
    service::{create_account, ensure_email_available},
    validation::{parse_user_id, validate_new_account, validate_profile},
};
use crate::{
    auth::extractors::Principal,
    error::{ApiError, ApiJson, ApiResponse},
    state::AppState,
};

fn not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

#[instrument(skip(state, _principal))]
pub async fn list_users(
    State(state): State<AppState>,
    _principal: Principal,
) -> Result<Json<ApiResponse<Vec<PublicAccount>>>, ApiError> {
    let users: Vec<PublicAccount> = state
        .users
        .list_recent(None)
        .await
        .map_err(ApiError::storage("Failed to fetch users"))?
        .into_iter()
        .map(PublicAccount::from)
        .collect();
    let count = users.len();
    Ok(Json(ApiResponse::ok(users).with_count(count)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicAccount>>, ApiError> {
    let id = parse_user_id(&id)?;
    let account = state
        .users
        .find_by_id(id)
        .await
        .map_err(ApiError::storage("Failed to fetch user"))?
        .ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(account.into())))
}

/// Administrative creation: no password required, no token issued.
#[instrument(skip(state, principal, payload), fields(by = %principal.id))]
pub async fn create_user(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PublicAccount>>), ApiError> {
    if payload.role.is_some() {
        return Err(ApiError::Validation(
            "Role cannot be set through this endpoint".into(),
        ));
    }
    let input = validate_new_account(payload.fields, payload.password)?;
    let account = create_account(&state, input, "Failed to create user").await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(account.into()))))
}

#[instrument(skip(state, principal, payload), fields(by = %principal.id))]
pub async fn update_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<PublicAccount>>, ApiError> {
    const FAILED: &str = "Failed to update user";

    let id = parse_user_id(&id)?;
    if payload.role.is_some() || payload.password.is_some() {
        warn!(target_id = %id, "role or password sent to profile update");
        return Err(ApiError::Validation(
            "Role and password cannot be changed through this endpoint".into(),
        ));
    }
    let update = validate_profile(payload.fields)?;

    ensure_email_available(&state, &update.email, Some(id), FAILED).await?;

    let account = state
        .users
        .update_profile(id, update)
        .await
        .map_err(ApiError::storage(FAILED))?
        .ok_or_else(not_found)?;

    info!(user_id = %account.id, "user updated");
    Ok(Json(ApiResponse::ok(account.into())))
}

#[instrument(skip(state, principal), fields(by = %principal.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicAccount>>, ApiError> {
    let id = parse_user_id(&id)?;
    let account = state
        .users
        .delete(id)
        .await
        .map_err(ApiError::storage("Failed to delete user"))?
        .ok_or_else(not_found)?;

    info!(user_id = %account.id, email = %account.email, by = %principal.email, "user deleted");
    Ok(Json(
        ApiResponse::ok(PublicAccount::from(account)).with_message("User deleted successfully"),
    ))
}
