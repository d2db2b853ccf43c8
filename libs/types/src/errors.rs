//! Error types for the matching engine
//!
//! Comprehensive error taxonomy using thiserror. Exhausting the matching
//! pool is not an error: it is handled by proportional scaling.

use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Whether the caller may retry the same request later.
    ///
    /// Only storage unavailability is transient; invalid input never is.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Storage(StorageError::Unavailable { .. }))
    }
}

/// Rejections of caller-supplied data. Signaled synchronously, never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Transfer amount must be positive, got {amount}")]
    NonPositiveAmount { amount: String },

    #[error("Process not found: {process_id}")]
    ProcessNotFound { process_id: String },

    #[error("Sender and recipient are the same delegate: {delegate_id}")]
    SelfTransfer { delegate_id: String },

    #[error("Matching pool must be non-negative, got {amount}")]
    NegativePool { amount: String },

    #[error("Invalid phase schedule: conversation starts {conversation_start}, election starts {election_start}")]
    InvalidSchedule {
        conversation_start: String,
        election_start: String,
    },
}

/// Storage-layer failures reported by ledger, registry or match store.
///
/// Concurrent upserts on one key are last-write-wins inside the store and
/// never reach the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Backend unreachable or poisoned. Surfaced to the caller; the core
    /// performs no internal retries.
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}
