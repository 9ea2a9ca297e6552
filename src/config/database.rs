//! PostgreSQL connection settings

use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound on `max_connections`.
const POOL_CEILING: u32 = 100;

/// The `database` section. Present only when texts and amendments are
/// stored in PostgreSQL.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` URL
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a resolution may wait for a pooled connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Opens a pool with these settings. The `texts` and `amends` tables
    /// must already exist.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .connect(&self.url)
            .await
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.url.split_once("://") {
            None if self.url.is_empty() => Err(ValidationError::MissingRequired("DATABASE_URL")),
            Some(("postgres" | "postgresql", _)) => Ok(()),
            _ => Err(ValidationError::InvalidDatabaseUrl),
        }?;
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > POOL_CEILING {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    20
}

fn default_acquire_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, min: u32, max: u32) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            min_connections: min,
            max_connections: max,
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }

    #[test]
    fn validation_cases() {
        let cases = [
            (config("", 1, 20), Err(ValidationError::MissingRequired("DATABASE_URL"))),
            (config("mysql://localhost/laws", 1, 20), Err(ValidationError::InvalidDatabaseUrl)),
            (config("localhost/laws", 1, 20), Err(ValidationError::InvalidDatabaseUrl)),
            (config("postgres://localhost/laws", 10, 5), Err(ValidationError::InvalidPoolSize)),
            (config("postgres://localhost/laws", 1, 150), Err(ValidationError::PoolSizeTooLarge)),
            (config("postgresql://civic@localhost:5432/laws", 1, 20), Ok(())),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate(), expected, "{}", config.url);
        }
    }

    #[test]
    fn unset_pool_keys_use_defaults() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"url": "postgres://localhost/laws"}"#).unwrap();

        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.acquire_timeout_secs, 5);
    }
}
