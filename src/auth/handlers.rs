use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthPayload, ChangePasswordRequest, LoginRequest, RegisterRequest},
        extractors::Principal,
        jwt::JwtKeys,
    },
    error::{ApiError, ApiJson, ApiResponse},
    state::AppState,
    users::{
        model::PublicAccount,
        service::create_account,
        validation::{check_password_strength, validate_login, validate_registration},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized(INVALID_CREDENTIALS.into())
}

#[instrument(skip(state, keys, payload))]
pub async fn register(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthPayload>>), ApiError> {
    const FAILED: &str = "Failed to register user";

    let input = validate_registration(payload.fields, payload.password).map_err(|e| {
        warn!(error = %e, "registration rejected");
        e
    })?;
    let account = create_account(&state, input, FAILED).await?;
    let token = keys.issue(account.id).map_err(ApiError::internal(FAILED))?;

    info!(user_id = %account.id, email = %account.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AuthPayload {
            user: account.into(),
            token,
        })),
    ))
}

#[instrument(skip(state, keys, payload))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    const FAILED: &str = "Failed to login user";

    let creds = validate_login(payload.email, payload.password)?;

    let account = match state
        .users
        .find_by_email(&creds.email)
        .await
        .map_err(ApiError::storage(FAILED))?
    {
        Some(a) => a,
        None => {
            warn!(email = %creds.email, "login unknown email");
            return Err(invalid_credentials());
        }
    };

    let Some(hash) = account.password_hash.as_deref() else {
        warn!(user_id = %account.id, "login for account without a password");
        return Err(invalid_credentials());
    };

    let ok = state
        .passwords
        .verify(&creds.password, hash)
        .map_err(ApiError::internal(FAILED))?;
    if !ok {
        warn!(email = %creds.email, user_id = %account.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let token = keys.issue(account.id).map_err(ApiError::internal(FAILED))?;

    info!(user_id = %account.id, email = %account.email, "user logged in");
    Ok(Json(ApiResponse::ok(AuthPayload {
        user: account.into(),
        token,
    })))
}

/// Re-reads the account instead of trusting the principal attached earlier.
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn get_me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<PublicAccount>>, ApiError> {
    let account = state
        .users
        .find_by_id(principal.id)
        .await
        .map_err(ApiError::storage("Failed to get user profile"))?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ApiResponse::ok(account.into())))
}

#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn change_password(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<PublicAccount>>, ApiError> {
    const FAILED: &str = "Failed to update password";

    let (current, new) = match (
        payload.current_password.filter(|p| !p.is_empty()),
        payload.new_password.filter(|p| !p.is_empty()),
    ) {
        (Some(c), Some(n)) => (c, n),
        _ => {
            return Err(ApiError::Validation(
                "currentPassword and newPassword are required".into(),
            ))
        }
    };
    check_password_strength(&new)?;

    let account = state
        .users
        .find_by_id(principal.id)
        .await
        .map_err(ApiError::storage(FAILED))?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let matches = match account.password_hash.as_deref() {
        Some(hash) => state
            .passwords
            .verify(&current, hash)
            .map_err(ApiError::internal(FAILED))?,
        None => false,
    };
    if !matches {
        warn!(user_id = %account.id, "password change with wrong current password");
        return Err(ApiError::Unauthorized("Current password is incorrect".into()));
    }

    let hash = state.passwords.hash(&new).map_err(ApiError::internal(FAILED))?;
    let updated = state
        .users
        .set_password_hash(account.id, &hash)
        .await
        .map_err(ApiError::storage(FAILED))?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %updated.id, "password changed");
    Ok(Json(
        ApiResponse::ok(updated.into()).with_message("Password updated successfully"),
    ))
}
