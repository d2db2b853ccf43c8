//! Matching engine configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::MatchingRule;

/// Largest precision rust_decimal can represent.
pub const MAX_PRECISION: u32 = 28;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Precision {0} exceeds the maximum of 28")]
    Precision(u32),
}

/// Matching engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// How raw demand is derived from contributions
    pub rule: MatchingRule,
    /// Decimal places matches are rounded to (widened to the pool's scale)
    pub precision: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            rule: MatchingRule::Proportional,
            precision: 2,
        }
    }
}

impl MatchingConfig {
    /// Parse from JSON; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MatchingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::Precision(self.precision));
        }
        Ok(())
    }
}
