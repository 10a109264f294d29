//! Input validation, run before any storage call.
//!
//! Registration and administrative creation are separate entry points on
//! purpose: registration requires a password, administrative creation
//! accepts an account without one.

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use super::{
    dto::AccountFields,
    model::{Address, FieldUpdate, ProfileUpdate},
};

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Account data that passed every field rule. The password is still
/// plaintext here and is hashed on creation.
#[derive(Debug, Clone)]
pub struct ValidatedAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$")
                .unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 ()\-]{5,19}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed value, or `None` when absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_len(errors: &mut Vec<String>, value: Option<&str>, max: usize, label: &str) {
    if value.is_some_and(|v| v.chars().count() > max) {
        errors.push(format!("{label} cannot be more than {max} characters"));
    }
}

pub fn parse_user_id(raw: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ValidationError::new("Invalid user ID format"))
}

pub fn check_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Field rules shared by every entry point, after required-field checks.
fn validate_fields(
    email: String,
    first_name: String,
    last_name: String,
    phone_number: Option<Option<String>>,
    address: Option<Option<Address>>,
) -> Result<ProfileUpdate, ValidationError> {
    let mut errors = Vec::new();

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        errors.push("Please enter a valid email address".to_string());
    }
    check_len(&mut errors, Some(&first_name), MAX_NAME_LEN, "First name");
    check_len(&mut errors, Some(&last_name), MAX_NAME_LEN, "Last name");

    let phone_number = match phone_number {
        None => FieldUpdate::Keep,
        Some(raw) => match present(raw) {
            None => FieldUpdate::Clear,
            Some(p) => {
                if !is_valid_phone(&p) {
                    errors.push("Please enter a valid phone number".to_string());
                }
                FieldUpdate::Set(p)
            }
        },
    };

    let address = match address {
        None => FieldUpdate::Keep,
        Some(raw) => match raw
            .map(|a| Address {
                street: present(a.street),
                city: present(a.city),
                state: present(a.state),
                zip_code: present(a.zip_code),
                country: present(a.country),
            })
            .filter(|a| !a.is_empty())
        {
            None => FieldUpdate::Clear,
            Some(a) => FieldUpdate::Set(a),
        },
    };
    if let FieldUpdate::Set(a) = &address {
        check_len(&mut errors, a.street.as_deref(), 100, "Street");
        check_len(&mut errors, a.city.as_deref(), 50, "City");
        check_len(&mut errors, a.state.as_deref(), 50, "State");
        check_len(&mut errors, a.zip_code.as_deref(), 20, "Zip code");
        check_len(&mut errors, a.country.as_deref(), 50, "Country");
    }

    if !errors.is_empty() {
        return Err(ValidationError(errors.join(", ")));
    }

    Ok(ProfileUpdate {
        email,
        first_name,
        last_name,
        phone_number,
        address,
    })
}

fn required_names(
    fields: AccountFields,
    missing: &str,
) -> Result<(String, String, String, AccountFields), ValidationError> {
    let email = present(fields.email.clone());
    let first = present(fields.first_name.clone());
    let last = present(fields.last_name.clone());
    match (email, first, last) {
        (Some(e), Some(f), Some(l)) => Ok((e, f, l, fields)),
        _ => Err(ValidationError::new(missing)),
    }
}

/// Public self-registration: password required.
pub fn validate_registration(
    fields: AccountFields,
    password: Option<String>,
) -> Result<ValidatedAccount, ValidationError> {
    const MISSING: &str = "Email, firstName, lastName, and password are required";
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ValidationError::new(MISSING))?;
    let (email, first, last, fields) = required_names(fields, MISSING)?;
    check_password_strength(&password)?;

    let profile = validate_fields(email, first, last, fields.phone_number, fields.address)?;
    Ok(with_password(profile, Some(password)))
}

/// Administrative creation: password optional, checked only when given.
pub fn validate_new_account(
    fields: AccountFields,
    password: Option<String>,
) -> Result<ValidatedAccount, ValidationError> {
    let (email, first, last, fields) =
        required_names(fields, "Email, firstName, and lastName are required")?;
    let password = password.filter(|p| !p.is_empty());
    if let Some(p) = &password {
        check_password_strength(p)?;
    }

    let profile = validate_fields(email, first, last, fields.phone_number, fields.address)?;
    Ok(with_password(profile, password))
}

pub fn validate_profile(fields: AccountFields) -> Result<ProfileUpdate, ValidationError> {
    let (email, first, last, fields) =
        required_names(fields, "Email, firstName, and lastName are required")?;
    validate_fields(email, first, last, fields.phone_number, fields.address)
}

pub fn validate_login(
    email: Option<String>,
    password: Option<String>,
) -> Result<Credentials, ValidationError> {
    match (present(email), password.filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => Ok(Credentials {
            email: normalize_email(&email),
            password,
        }),
        _ => Err(ValidationError::new("Email and password are required")),
    }
}

fn with_password(p: ProfileUpdate, password: Option<String>) -> ValidatedAccount {
    ValidatedAccount {
        email: p.email,
        first_name: p.first_name,
        last_name: p.last_name,
        password,
        phone_number: p.phone_number.into_option(),
        address: p.address.into_option(),
    }
}
