//! Transfer Ledger — committed transfers per process
//!
//! The engine only reads the ledger. Writes go through `TransferSink`,
//! which the in-memory ledger also implements so tests and simulations can
//! populate it. Transfers are immutable and never removed, so the count of
//! transfers in a process doubles as a version number for its ledger.

use std::collections::HashMap;
use std::sync::RwLock;

use types::errors::StorageError;
use types::ids::{DelegateId, ProcessId};
use types::transfer::Transfer;

use crate::poisoned;

// ── Ports ───────────────────────────────────────────────────────────

/// Read access to committed transfers.
///
/// Results are in arbitrary order and may contain several transfers from
/// the same sender to the same recipient.
pub trait TransferLedger: Send + Sync {
    /// All transfers of a process.
    fn transfers_for_process(&self, process_id: &ProcessId) -> Result<Vec<Transfer>, StorageError>;

    /// Transfers of a process addressed to one recipient.
    fn transfers_for_recipient(
        &self,
        process_id: &ProcessId,
        recipient: &DelegateId,
    ) -> Result<Vec<Transfer>, StorageError> {
        Ok(self
            .transfers_for_process(process_id)?
            .into_iter()
            .filter(|t| t.recipient == *recipient)
            .collect())
    }

    /// Number of committed transfers in a process.
    fn transfer_count(&self, process_id: &ProcessId) -> Result<usize, StorageError> {
        Ok(self.transfers_for_process(process_id)?.len())
    }
}

/// Write access to the ledger.
pub trait TransferSink: Send + Sync {
    fn append(&self, transfer: Transfer) -> Result<(), StorageError>;
}

// ── In-memory ledger ────────────────────────────────────────────────

/// Append-only ledger held in memory.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    transfers: RwLock<HashMap<ProcessId, Vec<Transfer>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total transfers across all processes.
    pub fn len(&self) -> usize {
        self.transfers
            .read()
            .map(|map| map.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransferLedger for InMemoryLedger {
    fn transfers_for_process(&self, process_id: &ProcessId) -> Result<Vec<Transfer>, StorageError> {
        let map = self.transfers.read().map_err(|_| poisoned("ledger"))?;
        Ok(map.get(process_id).cloned().unwrap_or_default())
    }

    fn transfers_for_recipient(
        &self,
        process_id: &ProcessId,
        recipient: &DelegateId,
    ) -> Result<Vec<Transfer>, StorageError> {
        let map = self.transfers.read().map_err(|_| poisoned("ledger"))?;
        Ok(map
            .get(process_id)
            .map(|ts| ts.iter().filter(|t| t.recipient == *recipient).cloned().collect())
            .unwrap_or_default())
    }

    fn transfer_count(&self, process_id: &ProcessId) -> Result<usize, StorageError> {
        let map = self.transfers.read().map_err(|_| poisoned("ledger"))?;
        Ok(map.get(process_id).map(Vec::len).unwrap_or(0))
    }
}

impl TransferSink for InMemoryLedger {
    fn append(&self, transfer: Transfer) -> Result<(), StorageError> {
        let mut map = self.transfers.write().map_err(|_| poisoned("ledger"))?;
        map.entry(transfer.process_id).or_default().push(transfer);
        Ok(())
    }
}
