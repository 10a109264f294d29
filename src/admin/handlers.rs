use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::Principal,
    error::{ApiError, ApiResponse},
    state::AppState,
    users::{
        model::{Account, PublicAccount, Role},
        validation::parse_user_id,
    },
};

const FAILED: &str = "Internal server error";
const RECENT_USERS: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub total_users: i64,
    pub total_admins: i64,
    pub regular_users: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    pub stats: UserCounts,
    pub recent_users: Vec<PublicAccount>,
}

/// Sets the target's role after the caller-specific checks in `guard` pass.
async fn change_role(
    state: &AppState,
    raw_id: &str,
    role: Role,
    guard: impl FnOnce(&Account) -> Result<(), ApiError>,
) -> Result<PublicAccount, ApiError> {
    let id = parse_user_id(raw_id)?;
    let target = state
        .users
        .find_by_id(id)
        .await
        .map_err(ApiError::storage(FAILED))?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    guard(&target)?;

    let updated = state
        .users
        .set_role(id, role)
        .await
        .map_err(ApiError::storage(FAILED))?
        // removed between the lookup and the write
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(updated.into())
}

#[instrument(skip(state, principal), fields(by = %principal.id))]
pub async fn promote(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicAccount>>, ApiError> {
    let account = change_role(&state, &id, Role::Admin, |target| {
        if target.role == Role::Admin {
            return Err(ApiError::Validation(
                "User is already an administrator".into(),
            ));
        }
        Ok(())
    })
    .await?;

    info!(user_id = %account.id, by = %principal.email, "user promoted");
    Ok(Json(
        ApiResponse::ok(account).with_message("User promoted to administrator successfully"),
    ))
}

#[instrument(skip(state, principal), fields(by = %principal.id))]
pub async fn demote(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicAccount>>, ApiError> {
    let account = change_role(&state, &id, Role::User, |target| {
        if target.role == Role::User {
            return Err(ApiError::Validation("User is already a regular user".into()));
        }
        if target.id == principal.id {
            warn!(user_id = %principal.id, "admin tried to demote themself");
            return Err(ApiError::Validation("Cannot demote yourself".into()));
        }
        Ok(())
    })
    .await?;

    info!(user_id = %account.id, by = %principal.email, "administrator demoted");
    Ok(Json(
        ApiResponse::ok(account).with_message("Administrator demoted to user successfully"),
    ))
}

#[instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatsPayload>>, ApiError> {
    let total_users = state.users.count().await.map_err(ApiError::storage(FAILED))?;
    let total_admins = state
        .users
        .count_by_role(Role::Admin)
        .await
        .map_err(ApiError::storage(FAILED))?;
    let recent_users = state
        .users
        .list_recent(Some(RECENT_USERS))
        .await
        .map_err(ApiError::storage(FAILED))?
        .into_iter()
        .map(PublicAccount::from)
        .collect();

    Ok(Json(ApiResponse::ok(StatsPayload {
        stats: UserCounts {
            total_users,
            total_admins,
            regular_users: total_users - total_admins,
        },
        recent_users,
    })))
}
