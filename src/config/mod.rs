//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CIVIC_AMEND` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use civic_amend::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! let engine = config.patch.engine();
//! println!("Resolutions time out after {:?}", config.resolution.timeout());
//! ```

mod database;
mod error;
mod logging;
mod patch;
mod resolution;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use patch::PatchSettings;
pub use resolution::ResolutionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a usable
/// in-memory setup. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Diff and match tuning of the patch engine
    #[serde(default)]
    pub patch: PatchSettings,

    /// Resolution deadline
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Log filter and output format
    #[serde(default)]
    pub logging: LoggingConfig,

    /// PostgreSQL connection; in-memory storage when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CIVIC_AMEND` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CIVIC_AMEND__PATCH__MARGIN=6` -> `patch.margin = 6`
    /// - `CIVIC_AMEND__PATCH__MAX_BODY_CHARS=50000` -> `patch.max_body_chars = 50000`
    /// - `CIVIC_AMEND__RESOLUTION__TIMEOUT_MS=2000` -> `resolution.timeout_ms = 2000`
    /// - `CIVIC_AMEND__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CIVIC_AMEND")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.patch.validate()?;
        self.resolution.validate()?;
        self.logging.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        Ok(())
    }
}
