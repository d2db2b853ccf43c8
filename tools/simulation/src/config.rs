//! Simulation parameters

use matching_engine::MatchingRule;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::errors::{EngineError, InputError, StorageError};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid simulation config: {0}")]
    Config(String),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<InputError> for SimulationError {
    fn from(err: InputError) -> Self {
        SimulationError::Engine(err.into())
    }
}

impl From<StorageError> for SimulationError {
    fn from(err: StorageError) -> Self {
        SimulationError::Engine(err.into())
    }
}

/// Most transfers one round may simulate.
pub const MAX_TRANSFERS: usize = 1_000_000;

/// Largest single transfer the simulator draws.
pub const MAX_TRANSFER_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Parameters of one simulated round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed; equal seeds give equal reports
    pub seed: u64,
    /// Number of delegates taking part
    pub participants: u32,
    /// Number of transfers made during Delegation
    pub transfers: usize,
    /// Matching pool of the process
    pub pool: Decimal,
    /// Upper bound of a single transfer, drawn in cents from 0.01
    pub max_transfer: Decimal,
    pub rule: MatchingRule,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            participants: 20,
            transfers: 200,
            pool: Decimal::from(1_000),
            max_transfer: Decimal::from(50),
            rule: MatchingRule::Proportional,
        }
    }
}

impl SimulationConfig {
    /// Parse from JSON; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.participants < 2 {
            return Err(SimulationError::Config(format!(
                "need at least 2 participants, got {}",
                self.participants
            )));
        }
        if self.pool < Decimal::ZERO {
            return Err(SimulationError::Config(format!("negative pool {}", self.pool)));
        }
        if self.transfers > MAX_TRANSFERS {
            return Err(SimulationError::Config(format!(
                "{} transfers exceeds the limit of {}",
                self.transfers, MAX_TRANSFERS
            )));
        }
        if self.max_transfer > MAX_TRANSFER_AMOUNT {
            return Err(SimulationError::Config(format!(
                "max_transfer {} exceeds {}",
                self.max_transfer, MAX_TRANSFER_AMOUNT
            )));
        }
        if self.max_transfer < Decimal::new(1, 2) {
            return Err(SimulationError::Config(format!(
                "max_transfer {} is below one cent",
                self.max_transfer
            )));
        }
        Ok(())
    }
}
