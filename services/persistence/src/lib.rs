//! Persistence layer for the matching engine
//!
//! Storage ports consumed by the engine and in-memory implementations of
//! each.
//!
//! - `ledger`: read-only transfer ledger port + append-only in-memory ledger
//! - `registry`: process lookup and status cache write-back
//! - `store`: match payment upsert store keyed by (process, recipient)

pub mod ledger;
pub mod registry;
pub mod store;

pub use ledger::{InMemoryLedger, TransferLedger, TransferSink};
pub use registry::{InMemoryProcessRegistry, ProcessRegistry};
pub use store::{InMemoryMatchStore, MatchStore, UpsertOutcome};

use types::errors::StorageError;

/// Map a poisoned lock to a transient storage failure.
pub(crate) fn poisoned(what: &str) -> StorageError {
    StorageError::Unavailable {
        reason: format!("{} lock poisoned", what),
    }
}
