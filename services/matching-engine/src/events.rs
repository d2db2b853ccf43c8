//! Event structures for the matching engine
//!
//! Emitted when matches are committed, when matching is skipped, and when
//! a process status is resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::ids::{DelegateId, ProcessId};
use types::numeric::Amount;
use types::process::ProcessStatus;
use uuid::Uuid;

/// Event emitted by the matching engine or phase resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub event_id: Uuid,
    pub process_id: ProcessId,
    pub kind: MatchEventKind,
    pub timestamp: DateTime<Utc>,
}

/// Event classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEventKind {
    /// A match payment row was inserted or changed
    MatchCommitted {
        recipient: DelegateId,
        amount: Amount,
        previous: Option<Amount>,
    },
    /// Recomputation left an existing row as it was
    MatchUnchanged { recipient: DelegateId, amount: Amount },
    /// Nothing to distribute
    MatchingSkipped { reason: SkipReason },
    /// Status derived from the schedule
    StatusResolved { status: ProcessStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ZeroPool,
    /// Ledger unchanged since the last commit
    AlreadyComputed,
}

impl MatchEvent {
    pub fn new(process_id: ProcessId, kind: MatchEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            process_id,
            kind,
            timestamp,
        }
    }

    pub fn is_commit(&self) -> bool {
        matches!(self.kind, MatchEventKind::MatchCommitted { .. })
    }
}
