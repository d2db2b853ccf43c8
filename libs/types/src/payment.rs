//! Match payment types
//!
//! A match payment is the amount of the shared pool owed to one recipient
//! of one process. Unique per (process, recipient); recomputation replaces it.

use crate::ids::{DelegateId, MatchPaymentId, ProcessId};
use crate::numeric::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Committed match for a (process, recipient) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPayment {
    pub payment_id: MatchPaymentId,
    pub process_id: ProcessId,
    pub recipient: DelegateId,
    pub amount: Amount,
    pub computed_at: DateTime<Utc>,
}

impl MatchPayment {
    pub fn new(
        process_id: ProcessId,
        recipient: DelegateId,
        amount: Amount,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payment_id: MatchPaymentId::new(),
            process_id,
            recipient,
            amount,
            computed_at,
        }
    }

    /// Storage key. Two payments with the same key describe the same row.
    pub fn key(&self) -> (ProcessId, DelegateId) {
        (self.process_id, self.recipient)
    }
}
