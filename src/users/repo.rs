use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{
    directory::{DirectoryError, UserDirectory},
    model::{Account, NewAccount, ProfileUpdate, Role},
    repo_types::UserRow,
};

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, role, \
                            phone_number, address, created_at, updated_at";

/// Postgres-backed directory. Email uniqueness is enforced by the
/// `users_email_lower_key` index, not by this code.
#[derive(Clone)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error) -> DirectoryError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return DirectoryError::DuplicateEmail;
        }
    }
    DirectoryError::Storage(e)
}

fn into_account(row: Option<UserRow>) -> Result<Option<Account>, DirectoryError> {
    row.map(Account::try_from).transpose()
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn insert(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash, role, phone_number, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&account.email)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.password_hash)
            .bind(Role::User.as_str())
            .bind(&account.phone_number)
            .bind(account.address.map(Json))
            .fetch_one(&self.db)
            .await
            .map_err(map_write_error)?;
        debug!(user_id = %row.id, "user row inserted");
        Account::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DirectoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        into_account(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DirectoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.db)
            .await?;
        into_account(row)
    }

    async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<Account>, DirectoryError> {
        // LIMIT NULL means no limit in Postgres.
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        rows.into_iter().map(Account::try_from).collect()
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, DirectoryError> {
        let sql = format!(
            r#"
            UPDATE users
               SET email = $2,
                   first_name = $3,
                   last_name = $4,
                   phone_number = CASE WHEN $5 THEN $6 ELSE phone_number END,
                   address = CASE WHEN $7 THEN $8 ELSE address END,
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let (set_phone, phone_number) = update.phone_number.into_parts();
        let (set_address, address) = update.address.into_parts();
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&update.email)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(set_phone)
            .bind(phone_number)
            .bind(set_address)
            .bind(address.map(Json))
            .fetch_optional(&self.db)
            .await
            .map_err(map_write_error)?;
        into_account(row)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<Account>, DirectoryError> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.db)
            .await?;
        into_account(row)
    }

    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Account>, DirectoryError> {
        let sql = format!(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(password_hash)
            .fetch_optional(&self.db)
            .await?;
        into_account(row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Account>, DirectoryError> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        into_account(row)
    }

    async fn count(&self) -> Result<i64, DirectoryError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, DirectoryError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }
}
