use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    directory::{DirectoryError, UserDirectory},
    model::{Account, NewAccount, ProfileUpdate, Role},
};

/// In-process directory with the same uniqueness rules as the Postgres one.
#[derive(Default)]
pub struct MemoryUserDirectory {
    rows: RwLock<Vec<Account>>, // insertion order
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn insert(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|a| same_email(&a.email, &account.email)) {
            return Err(DirectoryError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let stored = Account {
            id: Uuid::new_v4(),
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            password_hash: account.password_hash,
            role: Role::User,
            phone_number: account.phone_number,
            address: account.address,
            created_at: now,
            updated_at: now,
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DirectoryError> {
        Ok(self.rows.read().await.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DirectoryError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|a| same_email(&a.email, email))
            .cloned())
    }

    async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<Account>, DirectoryError> {
        let mut out: Vec<Account> = self.rows.read().await.iter().rev().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            out.truncate(limit.max(0) as usize);
        }
        Ok(out)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, DirectoryError> {
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|a| a.id != id && same_email(&a.email, &update.email))
        {
            return Err(DirectoryError::DuplicateEmail);
        }
        let Some(account) = rows.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        account.email = update.email;
        account.first_name = update.first_name;
        account.last_name = update.last_name;
        update.phone_number.apply(&mut account.phone_number);
        update.address.apply(&mut account.address);
        account.updated_at = OffsetDateTime::now_utc();
        Ok(Some(account.clone()))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<Account>, DirectoryError> {
        let mut rows = self.rows.write().await;
        Ok(rows.iter_mut().find(|a| a.id == id).map(|account| {
            account.role = role;
            account.updated_at = OffsetDateTime::now_utc();
            account.clone()
        }))
    }

    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Account>, DirectoryError> {
        let mut rows = self.rows.write().await;
        Ok(rows.iter_mut().find(|a| a.id == id).map(|account| {
            account.password_hash = Some(password_hash.to_string());
            account.updated_at = OffsetDateTime::now_utc();
            account.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Account>, DirectoryError> {
        let mut rows = self.rows.write().await;
        Ok(rows
            .iter()
            .position(|a| a.id == id)
            .map(|idx| rows.remove(idx)))
    }

    async fn count(&self) -> Result<i64, DirectoryError> {
        Ok(self.rows.read().await.len() as i64)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, DirectoryError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|a| a.role == role)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::FieldUpdate;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            password_hash: None,
            phone_number: None,
            address: None,
        }
    }

    fn profile(email: &str) -> ProfileUpdate {
        ProfileUpdate {
            email: email.into(),
            first_name: "New".into(),
            last_name: "Name".into(),
            phone_number: FieldUpdate::Keep,
            address: FieldUpdate::Keep,
        }
    }

    #[tokio::test]
    async fn distinct_emails_coexist() {
        let dir = MemoryUserDirectory::default();
        dir.insert(new_account("a@x.com")).await.unwrap();
        dir.insert(new_account("b@x.com")).await.unwrap();
        assert_eq!(dir.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let dir = MemoryUserDirectory::default();
        dir.insert(new_account("a@x.com")).await.unwrap();
        let err = dir.insert(new_account("A@X.com")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let dir = MemoryUserDirectory::default();
        dir.insert(new_account("a@x.com")).await.unwrap();
        let b = dir.insert(new_account("b@x.com")).await.unwrap();
        let err = dir.update_profile(b.id, profile("a@x.com")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateEmail));

        let same = dir.update_profile(b.id, profile("b@x.com")).await.unwrap();
        assert_eq!(same.unwrap().first_name, "New");
    }

    #[tokio::test]
    async fn list_is_newest_first_and_limited() {
        let dir = MemoryUserDirectory::default();
        for i in 0..4 {
            dir.insert(new_account(&format!("u{i}@x.com"))).await.unwrap();
        }
        let all = dir.list_recent(None).await.unwrap();
        assert_eq!(all.first().unwrap().email, "u3@x.com");
        assert_eq!(all.last().unwrap().email, "u0@x.com");
        assert_eq!(dir.list_recent(Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let dir = MemoryUserDirectory::default();
        let a = dir.insert(new_account("a@x.com")).await.unwrap();
        assert_eq!(dir.delete(a.id).await.unwrap().unwrap().id, a.id);
        assert!(dir.delete(a.id).await.unwrap().is_none());
        assert!(dir.find_by_id(a.id).await.unwrap().is_none());
    }
}
