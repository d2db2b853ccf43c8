//! Funding Round Simulation
//!
//! Seeded end-to-end simulation of a delegation process: random transfers
//! during Delegation, status resolution across every phase, and a report
//! of the resulting matches with invariant checks.
//!
//! # Modules
//! - `config` — Simulation parameters
//! - `engine` — Round simulator driving the matching engine on a simulated clock
//! - `scenarios` — Undersubscribed, oversubscribed and zero-pool rounds
//! - `export` — Report JSON export

pub mod config;
pub mod engine;
pub mod export;
pub mod scenarios;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
