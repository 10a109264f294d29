use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    auth::{jwt::JwtKeys, password::Passwords},
    config::AppConfig,
    users::{directory::UserDirectory, repo::PgUserDirectory},
};

/// Everything a request may touch. Built once at startup; read-only after.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserDirectory>,
    pub jwt: JwtKeys,
    pub passwords: Passwords,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let users = Arc::new(PgUserDirectory::new(db)) as Arc<dyn UserDirectory>;
        Self::from_parts(config, users)
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserDirectory>) -> anyhow::Result<Self> {
        let jwt = JwtKeys::new(&config.jwt);
        let passwords = Passwords::new(&config.hashing)?;
        Ok(Self {
            config,
            users,
            jwt,
            passwords,
        })
    }

    /// State backed by an empty in-memory directory.
    #[cfg(test)]
    pub fn fake_with(config: Arc<AppConfig>) -> Self {
        use crate::users::memory::MemoryUserDirectory;

        let users = Arc::new(MemoryUserDirectory::default()) as Arc<dyn UserDirectory>;
        Self::from_parts(config, users).expect("test config is valid")
    }
}
