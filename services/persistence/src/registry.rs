//! Process registry — pool and phase accessor
//!
//! Exposes a process's fixed matching pool and phase boundaries, and
//! accepts the resolved status back as a cache.

use std::collections::HashMap;
use std::sync::RwLock;

use types::errors::StorageError;
use types::ids::ProcessId;
use types::process::{Process, ProcessStatus};

use crate::poisoned;

/// Lookup and status write-back for processes.
pub trait ProcessRegistry: Send + Sync {
    fn get(&self, process_id: &ProcessId) -> Result<Option<Process>, StorageError>;

    /// Persist the resolved status. Unknown processes are ignored.
    fn set_status(&self, process_id: &ProcessId, status: ProcessStatus) -> Result<(), StorageError>;
}

/// Process registry held in memory.
#[derive(Debug, Default)]
pub struct InMemoryProcessRegistry {
    processes: RwLock<HashMap<ProcessId, Process>>,
}

impl InMemoryProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process, replacing any previous one with the same id.
    pub fn insert(&self, process: Process) -> Result<(), StorageError> {
        let mut map = self.processes.write().map_err(|_| poisoned("registry"))?;
        map.insert(process.process_id, process);
        Ok(())
    }

    /// All processes ordered by id (creation order for v7 ids).
    pub fn list(&self) -> Result<Vec<Process>, StorageError> {
        let map = self.processes.read().map_err(|_| poisoned("registry"))?;
        let mut processes: Vec<Process> = map.values().cloned().collect();
        processes.sort_by_key(|p| p.process_id);
        Ok(processes)
    }
}

impl ProcessRegistry for InMemoryProcessRegistry {
    fn get(&self, process_id: &ProcessId) -> Result<Option<Process>, StorageError> {
        let map = self.processes.read().map_err(|_| poisoned("registry"))?;
        Ok(map.get(process_id).cloned())
    }

    fn set_status(&self, process_id: &ProcessId, status: ProcessStatus) -> Result<(), StorageError> {
        let mut map = self.processes.write().map_err(|_| poisoned("registry"))?;
        if let Some(process) = map.get_mut(process_id) {
            process.status = status;
        }
        Ok(())
    }
}
