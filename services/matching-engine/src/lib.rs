//! Matching Engine Service
//!
//! Distributes a process's matching pool across the delegates that
//! received transfers, and resolves process phases from the clock.
//!
//! **Key Invariants:**
//! - Σ matches ≤ pool, with equality whenever demand exceeds the pool
//! - Deterministic matching (same ledger → same matches)
//! - At most one match row per (process, recipient)
//! - Estimates never write

pub mod config;
pub mod engine;
pub mod events;
pub mod matching;
pub mod phase;

pub use config::{ConfigError, MatchingConfig};
pub use engine::{MatchEstimate, MatchOutcome, MatchingEngine, ParticipantSummary};
pub use matching::{MatchingRule, PoolAllocation};
pub use phase::{MatchingTrigger, PhaseResolver, Resolution};
