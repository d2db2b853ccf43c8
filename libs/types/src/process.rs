//! Funding process and phase types
//!
//! A process is a time-boxed delegated-funding round with a fixed matching
//! pool. Its status is a pure function of the clock and two boundaries.

use crate::errors::InputError;
use crate::ids::ProcessId;
use crate::numeric::Amount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStatus {
    /// Participants delegate transfers (initial)
    Delegation,
    /// Transfers closed, matches computed, conversation open
    Deliberation,
    /// Voting (terminal)
    Election,
}

impl ProcessStatus {
    /// Matching becomes due as soon as the process leaves Delegation.
    pub fn matching_due(&self) -> bool {
        !matches!(self, ProcessStatus::Delegation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Delegation => "Delegation",
            ProcessStatus::Deliberation => "Deliberation",
            ProcessStatus::Election => "Election",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase boundaries of a process.
///
/// Invariant: conversation_start <= election_start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    pub conversation_start: DateTime<Utc>,
    pub election_start: DateTime<Utc>,
}

impl PhaseSchedule {
    /// Create a schedule, rejecting an election that starts before the
    /// conversation.
    pub fn new(
        conversation_start: DateTime<Utc>,
        election_start: DateTime<Utc>,
    ) -> Result<Self, InputError> {
        if conversation_start > election_start {
            return Err(InputError::InvalidSchedule {
                conversation_start: conversation_start.to_rfc3339(),
                election_start: election_start.to_rfc3339(),
            });
        }
        Ok(Self {
            conversation_start,
            election_start,
        })
    }

    /// Status at the given instant. Both boundaries are inclusive on the
    /// side of the later phase.
    pub fn status_at(&self, now: DateTime<Utc>) -> ProcessStatus {
        if now < self.conversation_start {
            ProcessStatus::Delegation
        } else if now < self.election_start {
            ProcessStatus::Deliberation
        } else {
            ProcessStatus::Election
        }
    }
}

/// A delegated-funding round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub process_id: ProcessId,
    pub title: String,
    /// Fixed at creation
    pub matching_pool: Amount,
    pub phases: PhaseSchedule,
    /// Cached result of the last status resolution. The schedule is the
    /// source of truth.
    pub status: ProcessStatus,
    pub created_at: DateTime<Utc>,
}

impl Process {
    /// Create a new process in Delegation.
    pub fn new(
        title: impl Into<String>,
        matching_pool: Decimal,
        phases: PhaseSchedule,
        created_at: DateTime<Utc>,
    ) -> Result<Self, InputError> {
        let matching_pool = Amount::try_new(matching_pool).ok_or_else(|| InputError::NegativePool {
            amount: matching_pool.to_string(),
        })?;

        Ok(Self {
            process_id: ProcessId::new(),
            title: title.into(),
            matching_pool,
            phases,
            status: ProcessStatus::Delegation,
            created_at,
        })
    }

    /// Whether there is anything to distribute at all.
    pub fn has_matching_pool(&self) -> bool {
        self.matching_pool.is_positive()
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> ProcessStatus {
        self.phases.status_at(now)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn rank(status: ProcessStatus) -> u8 {
        match status {
            ProcessStatus::Delegation => 0,
            ProcessStatus::Deliberation => 1,
            ProcessStatus::Election => 2,
        }
    }

    proptest! {
        #[test]
        fn prop_status_never_goes_backwards(
            gap in 0i64..1_000_000,
            a in -2_000_000i64..2_000_000,
            b in -2_000_000i64..2_000_000,
        ) {
            let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
            let schedule = PhaseSchedule::new(t1, t1 + Duration::seconds(gap)).unwrap();
            let (early, late) = (a.min(b), a.max(b));

            let before = schedule.status_at(t1 + Duration::seconds(early));
            let after = schedule.status_at(t1 + Duration::seconds(late));
            prop_assert!(rank(before) <= rank(after));
        }
    }
}
