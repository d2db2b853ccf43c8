//! Match calculation
//!
//! Pure functions from (transfers, pool) to per-recipient matches. No
//! state and no I/O: the engine feeds ledger snapshots in and persists
//! what comes out.

pub mod aggregate;
pub mod allocation;
pub mod rule;

pub use aggregate::{aggregate, Contributions};
pub use allocation::{allocate, Allocation, PoolAllocation, Saturation};
pub use rule::MatchingRule;

use types::numeric::Amount;
use types::transfer::Transfer;

use crate::config::MatchingConfig;

/// Aggregate transfers and split the pool under the configured rule.
///
/// Deterministic: depends only on the multiset of transfers, the pool and
/// the configuration.
pub fn compute_matches<'a>(
    transfers: impl IntoIterator<Item = &'a Transfer>,
    pool: Amount,
    config: &MatchingConfig,
) -> PoolAllocation {
    allocate(&aggregate(transfers), pool, config.rule, config.precision)
}
