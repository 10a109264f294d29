use std::{fmt, time::Duration};

use anyhow::{bail, ensure, Context};

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expires_in: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => bail!("unknown APP_ENV {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
}

impl AppConfig {
    /// Reads the process environment once at startup.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    ///
    /// A missing or empty `JWT_SECRET` is an error: the service must not
    /// come up without a signing key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let expires_in = match lookup("JWT_EXPIRES_IN") {
            Some(raw) => parse_expiry(&raw)?,
            None => Duration::from_secs(7 * 24 * 60 * 60),
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "users-service".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "users-service-clients".into()),
            expires_in,
        };

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: parse_var(&lookup, "PASSWORD_HASH_MEMORY_KIB")?
                .unwrap_or(defaults.memory_kib),
            iterations: parse_var(&lookup, "PASSWORD_HASH_ITERATIONS")?
                .unwrap_or(defaults.iterations),
            parallelism: parse_var(&lookup, "PASSWORD_HASH_PARALLELISM")?
                .unwrap_or(defaults.parallelism),
        };

        let environment = match lookup("APP_ENV") {
            Some(raw) => Environment::parse(&raw)?,
            None => Environment::Production,
        };

        Ok(Self {
            database_url,
            database_max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(10),
            environment,
            jwt,
            hashing,
        })
    }
}

/// `None` when unset; an error naming the variable when set but unparsable.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid {key} {raw:?}"))
        })
        .transpose()
}

/// Longest accepted token lifetime.
const MAX_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

/// Parses lifetimes like `7d`, `1h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_expiry(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid JWT_EXPIRES_IN {raw:?}"))?;
    let factor = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => bail!("invalid JWT_EXPIRES_IN unit {other:?}"),
    };
    let secs = amount
        .checked_mul(factor)
        .filter(|secs| *secs <= MAX_EXPIRY_SECS)
        .with_context(|| format!("JWT_EXPIRES_IN {raw:?} exceeds one year"))?;
    ensure!(secs > 0, "JWT_EXPIRES_IN must be positive");
    Ok(Duration::from_secs(secs))
}
