//! Patch engine configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::patch::{PatchConfig, PatchEngine};

/// Diff and match tuning, deserialized from the `patch` section.
///
/// Unset keys fall back to [`PatchConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PatchSettings {
    #[serde(default = "default_edit_cost")]
    pub edit_cost: usize,

    #[serde(default = "default_margin")]
    pub margin: usize,

    #[serde(default = "default_match_distance")]
    pub match_distance: usize,

    #[serde(default = "default_max_context")]
    pub max_context: usize,

    /// Proposals with a longer body are rejected before diffing
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
}

impl PatchSettings {
    /// Validate patch settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.margin == 0 {
            return Err(ValidationError::InvalidPatchMargin);
        }
        if self.max_context < self.margin {
            return Err(ValidationError::InvalidPatchContext);
        }
        if self.max_body_chars == 0 {
            return Err(ValidationError::InvalidBodyLimit);
        }
        Ok(())
    }

    /// Builds the engine these settings describe.
    pub fn engine(&self) -> PatchEngine {
        PatchEngine::new(PatchConfig::from(*self))
    }
}

impl From<PatchSettings> for PatchConfig {
    fn from(settings: PatchSettings) -> Self {
        PatchConfig {
            edit_cost: settings.edit_cost,
            margin: settings.margin,
            match_distance: settings.match_distance,
            max_context: settings.max_context,
            max_body_chars: settings.max_body_chars,
        }
    }
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            edit_cost: default_edit_cost(),
            margin: default_margin(),
            match_distance: default_match_distance(),
            max_context: default_max_context(),
            max_body_chars: default_max_body_chars(),
        }
    }
}

fn default_edit_cost() -> usize {
    PatchConfig::default().edit_cost
}

fn default_margin() -> usize {
    PatchConfig::default().margin
}

fn default_match_distance() -> usize {
    PatchConfig::default().match_distance
}

fn default_max_context() -> usize {
    PatchConfig::default().max_context
}

fn default_max_body_chars() -> usize {
    PatchConfig::default().max_body_chars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_defaults() {
        assert_eq!(PatchConfig::from(PatchSettings::default()), PatchConfig::default());
    }

    #[test]
    fn zero_margin_is_rejected() {
        let settings = PatchSettings {
            margin: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ValidationError::InvalidPatchMargin));
    }

    #[test]
    fn context_smaller_than_margin_is_rejected() {
        let settings = PatchSettings {
            margin: 8,
            max_context: 4,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ValidationError::InvalidPatchContext));
    }

    #[test]
    fn zero_body_limit_is_rejected() {
        let settings = PatchSettings {
            max_body_chars: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ValidationError::InvalidBodyLimit));
    }

    #[test]
    fn engine_uses_settings() {
        let settings = PatchSettings {
            match_distance: 10,
            ..Default::default()
        };
        assert_eq!(settings.engine().config().match_distance, 10);
    }
}
