//! Tracker configuration.
//!
//! [`TrackerConfig`] can be built in code, taken from
//! [`Default`], or parsed from a YAML snippet the host supplies. Every path
//! goes through [`TrackerConfig::validate`].

use serde::{Deserialize, Serialize};

/// Default merge distance for secondaries, in millimetres.
pub const DEFAULT_GAMMA_BREAK_MM: f64 = 9.0;

/// Errors that can occur when building or changing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `gamma_break` must be a finite, non-negative distance.
    #[error("gamma_break must be finite and non-negative, got {value}")]
    InvalidGammaBreak {
        /// The rejected value.
        value: f64,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse tracker config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Settings of a [`LineageTracker`](crate::tracker::LineageTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// When `true`, a secondary born farther than `gamma_break` from its
    /// parent lineage's origin gets its own lineage. When `false`, every
    /// secondary of a track that has a lineage joins it.
    #[serde(default = "default_true")]
    pub detailed_secondaries: bool,

    /// Distance (mm) within which a secondary's creation vertex is
    /// considered part of its parent's interaction.
    #[serde(default = "default_gamma_break")]
    pub gamma_break: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            detailed_secondaries: true,
            gamma_break: DEFAULT_GAMMA_BREAK_MM,
        }
    }
}

impl TrackerConfig {
    /// Parse and validate configuration from a YAML string. Missing keys
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidGammaBreak`] if the distance is rejected.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGammaBreak`] for a negative or
    /// non-finite `gamma_break`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_gamma_break(self.gamma_break)
    }
}

/// Accept finite, non-negative distances only.
pub(crate) fn validate_gamma_break(value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidGammaBreak { value })
    }
}

const fn default_true() -> bool {
    true
}

const fn default_gamma_break() -> f64 {
    DEFAULT_GAMMA_BREAK_MM
}
