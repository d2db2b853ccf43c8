//! Undersubscribed round
//!
//! The pool exceeds everything transferred, so every recipient is matched
//! one-to-one and part of the pool stays undistributed.

use rust_decimal::Decimal;

use crate::config::{SimulationConfig, SimulationError};
use crate::engine::RoundSimulator;
use crate::scenarios::ScenarioResult;

pub fn config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed,
        participants: 12,
        transfers: 60,
        // 60 transfers of at most 20 each can never reach the pool
        pool: Decimal::from(5_000),
        max_transfer: Decimal::from(20),
        ..Default::default()
    }
}

pub fn run(seed: u64) -> Result<ScenarioResult, SimulationError> {
    let report = RoundSimulator::run(config(seed))?;

    let one_to_one = report.matches.iter().all(|m| m.matched == m.received);
    let passed = report.all_invariants_hold() && one_to_one && report.distributed < report.pool;

    Ok(ScenarioResult {
        name: "undersubscribed".to_string(),
        passed,
        details: format!(
            "{} recipients matched one-to-one, {} of {} distributed.",
            report.matches.len(),
            report.distributed,
            report.pool,
        ),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undersubscribed() {
        let result = run(1).unwrap();
        assert!(result.passed, "{}", result.details);
        assert_eq!(result.report.distributed, result.report.total_transferred);
    }
}
