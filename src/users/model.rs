use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Admins satisfy every requirement; users only their own.
    pub fn satisfies(self, required: Role) -> bool {
        self == Role::Admin || self == required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.country.is_none()
    }
}

/// Stored account record. Deliberately not `Serialize`: only
/// [`PublicAccount`] ever leaves the service.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<Address>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Public part of the account returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            first_name: a.first_name,
            last_name: a.last_name,
            role: a.role,
            phone_number: a.phone_number,
            address: a.address,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// A record ready to be inserted; the password (if any) is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<Address>,
}

/// What a profile edit does to an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Field not sent: the stored value stays.
    Keep,
    /// Sent as null or blank.
    Clear,
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Value for a fresh record, where keeping and clearing both mean nothing.
    pub fn into_option(self) -> Option<T> {
        match self {
            FieldUpdate::Set(v) => Some(v),
            FieldUpdate::Keep | FieldUpdate::Clear => None,
        }
    }

    /// `(write?, new value)`, for storage that binds both.
    pub fn into_parts(self) -> (bool, Option<T>) {
        match self {
            FieldUpdate::Keep => (false, None),
            FieldUpdate::Clear => (true, None),
            FieldUpdate::Set(v) => (true, Some(v)),
        }
    }

    pub fn apply(self, current: &mut Option<T>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => *current = None,
            FieldUpdate::Set(v) => *current = Some(v),
        }
    }
}

/// Validated profile edit.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: FieldUpdate<String>,
    pub address: FieldUpdate<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        let now = OffsetDateTime::now_utc();
        Account {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            password_hash: Some("$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".into()),
            role: Role::User,
            phone_number: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_projection_drops_hash() {
        let json = serde_json::to_value(PublicAccount::from(account())).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("passwordHash"));
        assert!(!obj.contains_key("password_hash"));
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["role"], "user");
        assert_eq!(json["firstName"], "A");
        assert!(json["createdAt"].as_str().unwrap().contains('T'));
        assert!(!obj.contains_key("phoneNumber"));
    }

    #[test]
    fn field_update_apply() {
        let mut phone = Some("+1234567".to_string());
        FieldUpdate::Keep.apply(&mut phone);
        assert_eq!(phone.as_deref(), Some("+1234567"));
        FieldUpdate::Set("+7654321".to_string()).apply(&mut phone);
        assert_eq!(phone.as_deref(), Some("+7654321"));
        FieldUpdate::Clear.apply(&mut phone);
        assert!(phone.is_none());

        assert_eq!(FieldUpdate::<String>::Clear.into_parts(), (true, None));
        assert_eq!(FieldUpdate::<String>::Keep.into_parts(), (false, None));
    }

    #[test]
    fn role_parsing_and_rank() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert!(Role::Admin.satisfies(Role::User));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(!Role::User.satisfies(Role::Admin));
        assert_eq!(Role::default(), Role::User);
    }
}
