//! Match Persistence — upsert-by-key store for match payments
//!
//! Rows are keyed by (process, recipient). A `put` is a single critical
//! section on the store lock, so concurrent recomputations converging on
//! the same ledger can never leave a half-written row: the last writer
//! wins with a complete row.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;
use types::errors::StorageError;
use types::ids::{DelegateId, ProcessId};
use types::numeric::Amount;
use types::payment::MatchPayment;

use crate::poisoned;

/// What a `put` did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed for the key.
    Inserted,
    /// The stored amount changed.
    Updated,
    /// The stored row already held this amount and was left untouched.
    Unchanged,
}

/// Storage for committed match payments.
pub trait MatchStore: Send + Sync {
    /// Insert or replace the row for `(payment.process_id, payment.recipient)`.
    ///
    /// Implementations resolve write conflicts themselves (last write wins).
    fn put(&self, payment: MatchPayment) -> Result<UpsertOutcome, StorageError>;

    /// Stored amount, or zero when the pair has no row.
    fn get(&self, process_id: &ProcessId, recipient: &DelegateId) -> Result<Amount, StorageError>;

    /// Full row for a pair, if any.
    fn get_payment(
        &self,
        process_id: &ProcessId,
        recipient: &DelegateId,
    ) -> Result<Option<MatchPayment>, StorageError>;

    /// All rows of a process ordered by recipient.
    fn list(&self, process_id: &ProcessId) -> Result<Vec<MatchPayment>, StorageError>;

    /// Drop every row of a process. Models the cascade performed when a
    /// process is deleted; returns the number of rows removed.
    fn remove_process(&self, process_id: &ProcessId) -> Result<usize, StorageError>;
}

/// Match store held in memory, ordered by key.
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    rows: RwLock<BTreeMap<(ProcessId, DelegateId), MatchPayment>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row across processes, ordered by key.
    pub fn all(&self) -> Result<Vec<MatchPayment>, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("match store"))?;
        Ok(rows.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchStore for InMemoryMatchStore {
    fn put(&self, payment: MatchPayment) -> Result<UpsertOutcome, StorageError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("match store"))?;

        let outcome = match rows.get_mut(&payment.key()) {
            Some(existing) if existing.amount == payment.amount => UpsertOutcome::Unchanged,
            Some(existing) => {
                // Row identity survives recomputation
                existing.amount = payment.amount;
                existing.computed_at = payment.computed_at;
                UpsertOutcome::Updated
            }
            None => {
                rows.insert(payment.key(), payment.clone());
                UpsertOutcome::Inserted
            }
        };

        debug!(
            process_id = %payment.process_id,
            recipient = %payment.recipient,
            amount = %payment.amount,
            ?outcome,
            "Match payment upserted"
        );
        Ok(outcome)
    }

    fn get(&self, process_id: &ProcessId, recipient: &DelegateId) -> Result<Amount, StorageError> {
        Ok(self
            .get_payment(process_id, recipient)?
            .map(|p| p.amount)
            .unwrap_or(Amount::ZERO))
    }

    fn get_payment(
        &self,
        process_id: &ProcessId,
        recipient: &DelegateId,
    ) -> Result<Option<MatchPayment>, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("match store"))?;
        Ok(rows.get(&(*process_id, *recipient)).cloned())
    }

    fn list(&self, process_id: &ProcessId) -> Result<Vec<MatchPayment>, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("match store"))?;
        Ok(rows
            .range((*process_id, DelegateId::from_u128(0))..=(*process_id, DelegateId::from_u128(u128::MAX)))
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn remove_process(&self, process_id: &ProcessId) -> Result<usize, StorageError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("match store"))?;
        let before = rows.len();
        rows.retain(|(p, _), _| p != process_id);
        Ok(before - rows.len())
    }
}
