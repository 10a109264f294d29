use serde::{Deserialize, Serialize};

use crate::users::{dto::AccountFields, model::PublicAccount};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(flatten)]
    pub fields: AccountFields,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for a password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: PublicAccount,
    pub token: String,
}
