//! Matching engine core
//!
//! Reads the transfer ledger and the process registry, runs the match
//! calculator, and commits the results to the match store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use persistence::{MatchStore, ProcessRegistry, TransferLedger, TransferSink, UpsertOutcome};
use types::errors::{EngineError, InputError};
use types::ids::{DelegateId, ProcessId};
use types::numeric::Amount;
use types::payment::MatchPayment;
use types::process::Process;
use types::transfer::{CandidateTransfer, Transfer};

use crate::config::MatchingConfig;
use crate::events::{MatchEvent, MatchEventKind, SkipReason};
use crate::matching::{compute_matches, PoolAllocation};

/// Result of committing matches for a process
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub process_id: ProcessId,
    /// None when the pool was zero and nothing was computed
    pub allocation: Option<PoolAllocation>,
    pub events: Vec<MatchEvent>,
}

impl MatchOutcome {
    pub fn distributed(&self) -> Amount {
        self.allocation
            .as_ref()
            .map(|a| a.distributed)
            .unwrap_or(Amount::ZERO)
    }

    /// Number of rows inserted or changed by this commit.
    pub fn rows_written(&self) -> usize {
        self.events.iter().filter(|e| e.is_commit()).count()
    }
}

/// Predicted effect of a transfer that has not been submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEstimate {
    pub process_id: ProcessId,
    pub recipient: DelegateId,
    /// Match the recipient would get with the candidate added
    pub estimated_match: Amount,
    /// Match the recipient gets from the live ledger as it stands
    pub current_match: Amount,
    /// `estimated_match - current_match`. Can dip below zero by one
    /// rounding unit when remainders reshuffle.
    pub delta: Decimal,
}

/// What one participant sent and received in a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub process_id: ProcessId,
    pub participant: DelegateId,
    /// Transfers where the participant is sender or recipient, oldest first
    pub transfers: Vec<Transfer>,
    pub sent: Amount,
    pub received: Amount,
    /// Committed match, zero until matching has run
    pub committed_match: Amount,
}

/// Main matching engine
#[derive(Clone)]
pub struct MatchingEngine {
    ledger: Arc<dyn TransferLedger>,
    registry: Arc<dyn ProcessRegistry>,
    store: Arc<dyn MatchStore>,
    config: MatchingConfig,
}

impl MatchingEngine {
    pub fn new(
        ledger: Arc<dyn TransferLedger>,
        registry: Arc<dyn ProcessRegistry>,
        store: Arc<dyn MatchStore>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            ledger,
            registry,
            store,
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn TransferLedger> {
        &self.ledger
    }

    pub fn registry(&self) -> &Arc<dyn ProcessRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn MatchStore> {
        &self.store
    }

    /// Commit matches for `process` using the current time.
    pub fn match_transfers(&self, process: &Process) -> Result<MatchOutcome, EngineError> {
        self.match_transfers_at(process, Utc::now())
    }

    /// Commit matches for `process`, stamping rows with `now`.
    ///
    /// Upserts one row per recipient that received at least one transfer.
    /// Idempotent for an unchanged ledger: rows whose amount is unchanged
    /// are left untouched. A zero pool commits nothing.
    pub fn match_transfers_at(
        &self,
        process: &Process,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome, EngineError> {
        let process_id = process.process_id;

        if !process.has_matching_pool() {
            debug!(%process_id, "Zero matching pool, nothing to distribute");
            return Ok(MatchOutcome {
                process_id,
                allocation: None,
                events: vec![MatchEvent::new(
                    process_id,
                    MatchEventKind::MatchingSkipped {
                        reason: SkipReason::ZeroPool,
                    },
                    now,
                )],
            });
        }

        let transfers = self.ledger.transfers_for_process(&process_id)?;
        let allocation = compute_matches(&transfers, process.matching_pool, &self.config);

        let mut events = Vec::with_capacity(allocation.allocations.len());
        for alloc in &allocation.allocations {
            let previous = self.store.get_payment(&process_id, &alloc.recipient)?;
            let payment = MatchPayment::new(process_id, alloc.recipient, alloc.amount, now);

            let kind = match self.store.put(payment)? {
                UpsertOutcome::Unchanged => MatchEventKind::MatchUnchanged {
                    recipient: alloc.recipient,
                    amount: alloc.amount,
                },
                UpsertOutcome::Inserted | UpsertOutcome::Updated => MatchEventKind::MatchCommitted {
                    recipient: alloc.recipient,
                    amount: alloc.amount,
                    previous: previous.map(|p| p.amount),
                },
            };
            events.push(MatchEvent::new(process_id, kind, now));
        }

        let outcome = MatchOutcome {
            process_id,
            allocation: Some(allocation),
            events,
        };

        info!(
            %process_id,
            transfers = transfers.len(),
            recipients = outcome.allocation.as_ref().map(|a| a.allocations.len()).unwrap_or(0),
            pool = %process.matching_pool,
            distributed = %outcome.distributed(),
            rows_written = outcome.rows_written(),
            "Matches committed"
        );

        Ok(outcome)
    }

    /// Estimate the match `candidate.recipient` would receive if the
    /// candidate were added to the live ledger.
    ///
    /// Computed over every transfer of the process, since scaling depends
    /// on all recipients. Committed match rows are not consulted and
    /// nothing is written.
    pub fn estimate_match(&self, candidate: &CandidateTransfer) -> Result<MatchEstimate, EngineError> {
        let process = self.load_process(&candidate.process_id)?;
        let hypothetical = Transfer::from_candidate(candidate, Utc::now())?;

        let mut transfers = self.ledger.transfers_for_process(&process.process_id)?;
        let current = compute_matches(&transfers, process.matching_pool, &self.config)
            .amount_for(&candidate.recipient);

        transfers.push(hypothetical);
        let estimated = compute_matches(&transfers, process.matching_pool, &self.config)
            .amount_for(&candidate.recipient);

        debug!(
            process_id = %process.process_id,
            recipient = %candidate.recipient,
            amount = %candidate.amount,
            current = %current,
            estimated = %estimated,
            "Match estimated"
        );

        Ok(MatchEstimate {
            process_id: process.process_id,
            recipient: candidate.recipient,
            estimated_match: estimated,
            current_match: current,
            delta: estimated.as_decimal() - current.as_decimal(),
        })
    }

    /// Transfers involving `participant` plus its committed match.
    pub fn participant_summary(
        &self,
        process_id: &ProcessId,
        participant: &DelegateId,
    ) -> Result<ParticipantSummary, EngineError> {
        let process = self.load_process(process_id)?;

        let mut transfers: Vec<Transfer> = self
            .ledger
            .transfers_for_process(&process.process_id)?
            .into_iter()
            .filter(|t| t.involves(participant))
            .collect();
        transfers.sort_by_key(|t| (t.created_at, t.transfer_id));

        let sent = transfers
            .iter()
            .filter(|t| t.sender == *participant)
            .map(|t| t.amount)
            .sum();
        let received = transfers
            .iter()
            .filter(|t| t.recipient == *participant)
            .map(|t| t.amount)
            .sum();

        Ok(ParticipantSummary {
            process_id: process.process_id,
            participant: *participant,
            committed_match: self.store.get(&process.process_id, participant)?,
            transfers,
            sent,
            received,
        })
    }

    /// Validate a candidate and append it to the ledger through `sink`.
    pub fn record_transfer(
        &self,
        sink: &dyn TransferSink,
        candidate: &CandidateTransfer,
        now: DateTime<Utc>,
    ) -> Result<Transfer, EngineError> {
        self.load_process(&candidate.process_id)?;
        let transfer = Transfer::from_candidate(candidate, now)?;
        sink.append(transfer.clone())?;

        debug!(
            process_id = %transfer.process_id,
            transfer_id = %transfer.transfer_id,
            amount = %transfer.amount,
            "Transfer recorded"
        );
        Ok(transfer)
    }

    pub(crate) fn load_process(&self, process_id: &ProcessId) -> Result<Process, EngineError> {
        self.registry.get(process_id)?.ok_or_else(|| {
            InputError::ProcessNotFound {
                process_id: process_id.to_string(),
            }
            .into()
        })
    }
}
