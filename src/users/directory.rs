use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Account, NewAccount, ProfileUpdate, Role};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The unique email index rejected the write.
    #[error("User with this email already exists")]
    DuplicateEmail,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("corrupt user record: {0}")]
    Corrupt(String),
}

/// Persistent collection of account records.
///
/// Emails are compared in their normalized (trimmed, lowercased) form and
/// are unique across the collection. Mutations refresh `updated_at`.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn insert(&self, account: NewAccount) -> Result<Account, DirectoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DirectoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DirectoryError>;

    /// Newest first. `None` returns every record.
    async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<Account>, DirectoryError>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, DirectoryError>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<Account>, DirectoryError>;

    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Account>, DirectoryError>;

    /// Removes the record and returns it as it was.
    async fn delete(&self, id: Uuid) -> Result<Option<Account>, DirectoryError>;

    async fn count(&self) -> Result<i64, DirectoryError>;

    async fn count_by_role(&self, role: Role) -> Result<i64, DirectoryError>;
}
