//! Oversubscribed round
//!
//! Transfers far exceed the pool, so matches are scaled down and the whole
//! pool is distributed to the cent.

use rust_decimal::Decimal;

use crate::config::{SimulationConfig, SimulationError};
use crate::engine::RoundSimulator;
use crate::scenarios::ScenarioResult;

pub fn config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed,
        participants: 25,
        transfers: 400,
        pool: Decimal::new(100_001, 2),
        max_transfer: Decimal::from(100),
        ..Default::default()
    }
}

pub fn run(seed: u64) -> Result<ScenarioResult, SimulationError> {
    let report = RoundSimulator::run(config(seed))?;

    let scaled = report.matches.iter().all(|m| m.matched <= m.received);
    let exhausted = report.distributed == report.pool;
    let passed = report.all_invariants_hold() && scaled && exhausted;

    Ok(ScenarioResult {
        name: "oversubscribed".to_string(),
        passed,
        details: format!(
            "{} transferred against a pool of {}; {} distributed across {} recipients.",
            report.total_transferred,
            report.pool,
            report.distributed,
            report.matches.len(),
        ),
        report,
    })
}
