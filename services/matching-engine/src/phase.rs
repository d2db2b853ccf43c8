//! Phase resolver
//!
//! Derives a process's status from the clock on every read and makes sure
//! matches are committed once the process has left Delegation.
//!
//! Matching is memoized per process: a guard remembers the ledger size at
//! the last commit and the calculator only runs again when the ledger has
//! grown. Guards are per-process mutexes, so concurrent reads of one
//! process compute at most once per ledger state while other processes
//! proceed in parallel.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use types::errors::{EngineError, StorageError};
use types::ids::ProcessId;
use types::process::ProcessStatus;

use crate::engine::{MatchOutcome, MatchingEngine};
use crate::events::{MatchEvent, MatchEventKind, SkipReason};

/// What the resolver did about matching on one read.
#[derive(Debug, Clone)]
pub enum MatchingTrigger {
    /// Process still in Delegation
    NotDue,
    /// Pool is zero; the calculator is never invoked
    ZeroPool,
    /// Ledger unchanged since the last commit
    AlreadyComputed,
    /// Matches were (re)committed on this read
    Computed(MatchOutcome),
}

/// Result of resolving a process's status
#[derive(Debug, Clone)]
pub struct Resolution {
    pub process_id: ProcessId,
    pub status: ProcessStatus,
    pub matching: MatchingTrigger,
    pub events: Vec<MatchEvent>,
}

#[derive(Debug, Default)]
struct MatchGuard {
    /// Ledger size observed before the last successful commit
    committed_at_count: Option<usize>,
}

/// Time-triggered status resolution with memoized match commits
pub struct PhaseResolver {
    engine: Arc<MatchingEngine>,
    guards: DashMap<ProcessId, Arc<Mutex<MatchGuard>>>,
}

impl PhaseResolver {
    pub fn new(engine: Arc<MatchingEngine>) -> Self {
        Self {
            engine,
            guards: DashMap::new(),
        }
    }

    pub fn engine(&self) -> &Arc<MatchingEngine> {
        &self.engine
    }

    /// Resolve the status at `now`, committing matches first if due.
    pub fn resolve_status(&self, process_id: &ProcessId, now: DateTime<Utc>) -> Result<ProcessStatus, EngineError> {
        self.resolve(process_id, now).map(|r| r.status)
    }

    /// Resolve the status against the wall clock.
    pub fn resolve_status_now(&self, process_id: &ProcessId) -> Result<ProcessStatus, EngineError> {
        self.resolve_status(process_id, Utc::now())
    }

    /// Full resolution, reporting what happened to matching.
    ///
    /// Status is always recomputed from the schedule; the value written
    /// back to the registry is only a cache.
    pub fn resolve(&self, process_id: &ProcessId, now: DateTime<Utc>) -> Result<Resolution, EngineError> {
        let process = self.engine.load_process(process_id)?;
        let status = process.status_at(now);

        let matching = if !status.matching_due() {
            MatchingTrigger::NotDue
        } else if !process.has_matching_pool() {
            MatchingTrigger::ZeroPool
        } else {
            self.commit_once(&process, now)?
        };

        if process.status != status {
            info!(%process_id, from = %process.status, to = %status, "Process status changed");
        }
        self.engine.registry().set_status(process_id, status)?;

        let mut events = match &matching {
            MatchingTrigger::Computed(outcome) => outcome.events.clone(),
            MatchingTrigger::AlreadyComputed => vec![MatchEvent::new(
                *process_id,
                MatchEventKind::MatchingSkipped {
                    reason: SkipReason::AlreadyComputed,
                },
                now,
            )],
            MatchingTrigger::ZeroPool => vec![MatchEvent::new(
                *process_id,
                MatchEventKind::MatchingSkipped {
                    reason: SkipReason::ZeroPool,
                },
                now,
            )],
            MatchingTrigger::NotDue => Vec::new(),
        };
        events.push(MatchEvent::new(*process_id, MatchEventKind::StatusResolved { status }, now));

        Ok(Resolution {
            process_id: *process_id,
            status,
            matching,
            events,
        })
    }

    /// Forget the memoized commit so the next qualifying read recomputes.
    pub fn invalidate(&self, process_id: &ProcessId) {
        self.guards.remove(process_id);
    }

    fn commit_once(
        &self,
        process: &types::process::Process,
        now: DateTime<Utc>,
    ) -> Result<MatchingTrigger, EngineError> {
        let process_id = process.process_id;
        // Clone the Arc out so the map shard is not held while computing
        let guard = Arc::clone(self.guards.entry(process_id).or_default().value());
        let mut guard = guard.lock().map_err(|_| StorageError::Unavailable {
            reason: format!("match guard for {} poisoned", process_id),
        })?;

        // Read the size before the ledger: a transfer landing in between
        // only causes one extra recomputation later, never a missed one
        let count = self.engine.ledger().transfer_count(&process_id)?;
        if guard.committed_at_count == Some(count) {
            debug!(%process_id, transfers = count, "Matches already committed for this ledger");
            return Ok(MatchingTrigger::AlreadyComputed);
        }

        let outcome = self.engine.match_transfers_at(process, now)?;
        guard.committed_at_count = Some(count);
        Ok(MatchingTrigger::Computed(outcome))
    }
}
