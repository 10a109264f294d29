use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    directory::DirectoryError,
    model::{Account, Address, Role},
};

/// User row as stored in Postgres.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>, // Argon2 PHC string, NULL until a password is set
    pub role: String,
    pub phone_number: Option<String>,
    pub address: Option<Json<Address>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for Account {
    type Error = DirectoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role: Role = r
            .role
            .parse()
            .map_err(|e| DirectoryError::Corrupt(format!("user {}: {e}", r.id)))?;
        Ok(Self {
            id: r.id,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            password_hash: r.password_hash,
            role,
            phone_number: r.phone_number,
            address: r.address.map(|Json(a)| a),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
