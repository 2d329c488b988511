//! Connection settings and pool construction on top of sea-orm.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use thiserror::Error;

/// Shared pooled connection. Cloning is cheap.
pub type DbPool = DatabaseConnection;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL missing")]
    MissingUrl,
    #[error("invalid value for {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
    #[error(transparent)]
    Connect(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(8),
        }
    }

    /// Reads `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(DbError::MissingUrl)?;
        let mut settings = Self::new(url);
        if let Some(raw) = lookup("DATABASE_MAX_CONNECTIONS") {
            settings.max_connections = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(DbError::InvalidSetting {
                    key: "DATABASE_MAX_CONNECTIONS",
                    value: raw,
                })?;
        }
        Ok(settings)
    }

    pub async fn connect(&self) -> DbResult<DbPool> {
        let mut options = ConnectOptions::new(self.url.clone());
        options
            .max_connections(self.max_connections)
            .connect_timeout(self.connect_timeout)
            .sqlx_logging(false);
        let pool = Database::connect(options).await?;
        tracing::debug!(max_connections = self.max_connections, "database pool ready");
        Ok(pool)
    }
}

/// True when the database answers a round trip.
pub async fn ping(pool: &DbPool) -> bool {
    pool.ping().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn url_is_required() {
        let err = DatabaseSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, DbError::MissingUrl));
    }

    #[test]
    fn max_connections_defaults_and_parses() {
        let settings =
            DatabaseSettings::from_lookup(lookup(&[("DATABASE_URL", "postgres://x/y")])).unwrap();
        assert_eq!(settings.max_connections, DEFAULT_MAX_CONNECTIONS);

        let settings = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
        ]))
        .unwrap();
        assert_eq!(settings.max_connections, 25);

        let err = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::InvalidSetting { .. }));
    }

    #[tokio::test]
    async fn connects_and_pings_sqlite() {
        let mut settings = DatabaseSettings::new("sqlite::memory:");
        settings.max_connections = 1;
        let pool = settings.connect().await.unwrap();
        assert!(ping(&pool).await);
    }
}
