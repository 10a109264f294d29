use tracing::info;
use uuid::Uuid;

use super::{
    model::{Account, NewAccount},
    validation::ValidatedAccount,
};
use crate::{error::ApiError, state::AppState};

const EMAIL_TAKEN: &str = "User with this email already exists";

/// Fails with `Conflict` when `email` belongs to an account other than `except`.
///
/// This is only the friendly pre-check; the unique index still decides races.
pub async fn ensure_email_available(
    state: &AppState,
    email: &str,
    except: Option<Uuid>,
    public: &'static str,
) -> Result<(), ApiError> {
    let existing = state
        .users
        .find_by_email(email)
        .await
        .map_err(ApiError::storage(public))?;
    match existing {
        Some(other) if Some(other.id) != except => Err(ApiError::Conflict(EMAIL_TAKEN.into())),
        _ => Ok(()),
    }
}

/// Hashes the password when one was given and stores the new account.
pub async fn create_account(
    state: &AppState,
    input: ValidatedAccount,
    public: &'static str,
) -> Result<Account, ApiError> {
    ensure_email_available(state, &input.email, None, public).await?;

    let password_hash = input
        .password
        .as_deref()
        .map(|plain| state.passwords.hash(plain))
        .transpose()
        .map_err(ApiError::internal(public))?;

    let account = state
        .users
        .insert(NewAccount {
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            password_hash,
            phone_number: input.phone_number,
            address: input.address,
        })
        .await
        .map_err(ApiError::storage(public))?;

    info!(
        user_id = %account.id,
        email = %account.email,
        has_password = account.password_hash.is_some(),
        "account created"
    );
    Ok(account)
}
