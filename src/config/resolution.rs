//! Resolution configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionConfig {
    /// Deadline for the locked storage phase of one resolution, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ResolutionConfig {
    /// Get the resolution deadline as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate resolution configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 || self.timeout_ms > 60_000 {
            return Err(ValidationError::InvalidResolutionTimeout);
        }
        Ok(())
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_five_seconds() {
        let config = ResolutionConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ResolutionConfig { timeout_ms: 0 };
        assert_eq!(config.validate(), Err(ValidationError::InvalidResolutionTimeout));
    }

    #[test]
    fn excessive_timeout_is_rejected() {
        let config = ResolutionConfig { timeout_ms: 120_000 };
        assert!(config.validate().is_err());
    }
}
