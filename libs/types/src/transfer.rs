//! Transfer types
//!
//! A transfer is a committed contribution from a sender to a recipient
//! within one process. Transfers are immutable once created.

use crate::errors::InputError;
use crate::ids::{DelegateId, ProcessId, TransferId};
use crate::numeric::Amount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A transfer that has not been committed to the ledger yet.
///
/// The amount is kept raw so validation can report what the caller sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransfer {
    pub process_id: ProcessId,
    pub sender: DelegateId,
    pub recipient: DelegateId,
    pub amount: Decimal,
}

impl CandidateTransfer {
    pub fn new(
        process_id: ProcessId,
        sender: DelegateId,
        recipient: DelegateId,
        amount: Decimal,
    ) -> Self {
        Self {
            process_id,
            sender,
            recipient,
            amount,
        }
    }

    /// Check the fields that can be validated without a ledger.
    ///
    /// Returns the validated positive amount.
    pub fn validate(&self) -> Result<Amount, InputError> {
        let amount = Amount::try_new(self.amount)
            .filter(Amount::is_positive)
            .ok_or_else(|| InputError::NonPositiveAmount {
                amount: self.amount.to_string(),
            })?;

        if self.sender == self.recipient {
            return Err(InputError::SelfTransfer {
                delegate_id: self.sender.to_string(),
            });
        }

        Ok(amount)
    }
}

/// Committed transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub transfer_id: TransferId,
    pub process_id: ProcessId,
    pub sender: DelegateId,
    pub recipient: DelegateId,
    /// Always positive
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Commit a candidate, validating it first.
    pub fn from_candidate(
        candidate: &CandidateTransfer,
        created_at: DateTime<Utc>,
    ) -> Result<Self, InputError> {
        let amount = candidate.validate()?;
        Ok(Self {
            transfer_id: TransferId::new(),
            process_id: candidate.process_id,
            sender: candidate.sender,
            recipient: candidate.recipient,
            amount,
            created_at,
        })
    }

    /// Whether the delegate took part in this transfer on either side.
    pub fn involves(&self, delegate: &DelegateId) -> bool {
        self.sender == *delegate || self.recipient == *delegate
    }
}
