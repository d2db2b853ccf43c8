//! Scenario simulation modules
//!
//! Each scenario runs one seeded round in a specific funding regime and
//! checks the behaviour that regime is supposed to show.

pub mod oversubscribed;
pub mod undersubscribed;
pub mod zero_pool;

use crate::config::SimulationError;
use crate::engine::RoundReport;
use serde::{Deserialize, Serialize};

/// Result of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub details: String,
    pub report: RoundReport,
}

/// Run every scenario with the given seed.
pub fn run_all(seed: u64) -> Result<Vec<ScenarioResult>, SimulationError> {
    Ok(vec![
        undersubscribed::run(seed)?,
        oversubscribed::run(seed)?,
        zero_pool::run(seed)?,
    ])
}
