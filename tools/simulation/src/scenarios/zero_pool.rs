//! Zero-pool round
//!
//! A process created without a pool still moves through every phase but
//! never gets a match row.

use rust_decimal::Decimal;

use crate::config::{SimulationConfig, SimulationError};
use crate::engine::RoundSimulator;
use crate::scenarios::ScenarioResult;
use types::process::ProcessStatus;

pub fn config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed,
        transfers: 50,
        pool: Decimal::ZERO,
        ..Default::default()
    }
}

pub fn run(seed: u64) -> Result<ScenarioResult, SimulationError> {
    let report = RoundSimulator::run(config(seed))?;

    let skipped = report
        .status_trace
        .iter()
        .filter(|s| s.status != ProcessStatus::Delegation)
        .all(|s| s.matching == "zero_pool");
    let passed = report.all_invariants_hold() && skipped && report.matches.is_empty();

    Ok(ScenarioResult {
        name: "zero_pool".to_string(),
        passed,
        details: format!(
            "{} transferred, final status {:?}, {} match rows.",
            report.total_transferred,
            report.final_status(),
            report.matches.len(),
        ),
        report,
    })
}
