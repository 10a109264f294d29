use serde::{Deserialize, Deserializer};

use super::model::Address;

/// Profile fields accepted by registration, creation and update.
/// Everything is optional here so that missing fields get our own message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFields {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some(None)` is an explicit `null`, which clears the field on update.
    #[serde(default, deserialize_with = "present_or_null")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub address: Option<Option<Address>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub fields: AccountFields,
    pub password: Option<String>,
    pub role: Option<serde_json::Value>,
}

/// Request body for `PUT /users/:id`. `role` and `password` are only read
/// to refuse them.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub fields: AccountFields,
    pub password: Option<serde_json::Value>,
    pub role: Option<serde_json::Value>,
}
