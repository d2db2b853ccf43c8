//! Round simulator
//!
//! Drives a real `MatchingEngine` and `PhaseResolver` over in-memory stores
//! on a simulated clock. Transfers are drawn from a seeded ChaCha8 RNG, so
//! a given config always produces the same report.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use matching_engine::{MatchingConfig, MatchingEngine, MatchingRule, MatchingTrigger, PhaseResolver};
use persistence::{InMemoryLedger, InMemoryMatchStore, InMemoryProcessRegistry, MatchStore};
use types::ids::{DelegateId, ProcessId};
use types::numeric::Amount;
use types::process::{PhaseSchedule, Process, ProcessStatus};
use types::transfer::CandidateTransfer;

use crate::config::{SimulationConfig, SimulationError};

/// Status observed at one instant of the simulated clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSample {
    pub at: DateTime<Utc>,
    pub status: ProcessStatus,
    /// What the resolver did about matching on this read
    pub matching: String,
}

/// Committed match for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientMatch {
    pub recipient: DelegateId,
    pub received: Amount,
    pub matched: Amount,
}

/// Named invariant and whether the round satisfied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantCheck {
    pub name: String,
    pub passed: bool,
}

/// Outcome of one simulated round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub seed: u64,
    pub process_id: ProcessId,
    pub pool: Amount,
    pub transfers: usize,
    pub total_transferred: Amount,
    pub distributed: Amount,
    pub status_trace: Vec<StatusSample>,
    /// Sorted by recipient
    pub matches: Vec<RecipientMatch>,
    pub invariants: Vec<InvariantCheck>,
}

impl RoundReport {
    pub fn all_invariants_hold(&self) -> bool {
        self.invariants.iter().all(|c| c.passed)
    }

    pub fn final_status(&self) -> Option<ProcessStatus> {
        self.status_trace.last().map(|s| s.status)
    }
}

/// Seeded simulator for a single delegation process.
pub struct RoundSimulator {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    start: DateTime<Utc>,
}

impl RoundSimulator {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| SimulationError::Config("simulation epoch out of range".to_string()))?;
        Ok(Self { config, rng, start })
    }

    /// Build, run and check a round described by `config`.
    pub fn run(config: SimulationConfig) -> Result<RoundReport, SimulationError> {
        Self::new(config)?.simulate()
    }

    fn simulate(mut self) -> Result<RoundReport, SimulationError> {
        let ledger = Arc::new(InMemoryLedger::new());
        let registry = Arc::new(InMemoryProcessRegistry::new());
        let store = Arc::new(InMemoryMatchStore::new());

        let conversation_start = self.start + Duration::days(1);
        let election_start = self.start + Duration::days(8);
        let phases = PhaseSchedule::new(conversation_start, election_start)?;

        let mut process = Process::new("Simulated round", self.config.pool, phases, self.start)?;
        process.process_id = ProcessId::from_uuid(Uuid::from_u128(self.rng.gen()));
        let process_id = process.process_id;
        registry.insert(process.clone())?;

        let engine = Arc::new(MatchingEngine::new(
            ledger.clone(),
            registry.clone(),
            store.clone(),
            MatchingConfig {
                rule: self.config.rule,
                ..MatchingConfig::default()
            },
        ));
        let resolver = PhaseResolver::new(engine.clone());

        // ── Delegation: random transfers ──
        let max_cents = (self.config.max_transfer * Decimal::from(100))
            .trunc()
            .to_i64()
            .unwrap_or(1)
            .max(1);
        let slots = i32::try_from(self.config.transfers + 1)
            .map_err(|_| SimulationError::Config(format!("{} transfers do not fit the clock", self.config.transfers)))?;
        let step = Duration::hours(24) / slots;
        let mut received: BTreeMap<DelegateId, Decimal> = BTreeMap::new();

        for slot in 1..slots {
            let (sender, recipient) = self.pick_pair();
            let amount = Decimal::new(self.rng.gen_range(1..=max_cents), 2);
            let candidate = CandidateTransfer::new(process_id, sender, recipient, amount);
            let at = self.start + step * slot;

            engine.record_transfer(ledger.as_ref(), &candidate, at)?;
            *received.entry(recipient).or_insert(Decimal::ZERO) += amount;
        }
        debug!(%process_id, transfers = ledger.len(), "Delegation transfers recorded");

        // ── Status resolution across phases ──
        let instants = [
            self.start + Duration::hours(12),
            conversation_start,
            conversation_start + Duration::days(3),
            election_start,
        ];
        let mut status_trace = Vec::with_capacity(instants.len());
        for at in instants {
            let resolution = resolver.resolve(&process_id, at)?;
            status_trace.push(StatusSample {
                at,
                status: resolution.status,
                matching: describe(&resolution.matching),
            });
        }

        // ── Estimate must leave the ledger and the store untouched ──
        let rows_before = store.all()?;
        let (sender, recipient) = self.pick_pair();
        let extra = CandidateTransfer::new(process_id, sender, recipient, Decimal::ONE);
        engine.estimate_match(&extra)?;
        let estimate_pure = store.all()? == rows_before && ledger.len() == self.config.transfers;

        let rows = store.list(&process_id)?;
        let matches: Vec<RecipientMatch> = rows
            .iter()
            .map(|row| RecipientMatch {
                recipient: row.recipient,
                received: Amount::try_new(received.get(&row.recipient).copied().unwrap_or_default())
                    .unwrap_or(Amount::ZERO),
                matched: row.amount,
            })
            .collect();

        let pool = process.matching_pool;
        let distributed: Amount = matches.iter().map(|m| m.matched).sum();
        let total_transferred: Amount = received
            .values()
            .filter_map(|v| Amount::try_new(*v))
            .sum();

        let invariants = vec![
            check("pool_not_exceeded", distributed <= pool),
            check(
                "pool_exhausted_when_oversubscribed",
                self.config.rule != MatchingRule::Proportional
                    || pool.is_zero()
                    || total_transferred <= pool
                    || distributed == pool,
            ),
            check(
                "one_row_per_recipient",
                pool.is_zero() || rows.len() == received.len(),
            ),
            check("zero_pool_has_no_rows", !pool.is_zero() || rows.is_empty()),
            check("estimate_is_pure", estimate_pure),
            check(
                "phases_in_order",
                status_trace.iter().map(|s| s.status).collect::<Vec<_>>()
                    == vec![
                        ProcessStatus::Delegation,
                        ProcessStatus::Deliberation,
                        ProcessStatus::Deliberation,
                        ProcessStatus::Election,
                    ],
            ),
        ];

        let report = RoundReport {
            seed: self.config.seed,
            process_id,
            pool,
            transfers: self.config.transfers,
            total_transferred,
            distributed,
            status_trace,
            matches,
            invariants,
        };

        info!(
            seed = report.seed,
            %process_id,
            transfers = report.transfers,
            pool = %report.pool,
            distributed = %report.distributed,
            passed = report.all_invariants_hold(),
            "Round simulated"
        );

        Ok(report)
    }

    /// Two distinct delegates.
    fn pick_pair(&mut self) -> (DelegateId, DelegateId) {
        let n = self.config.participants as u128;
        let sender = self.rng.gen_range(0..n);
        let mut recipient = self.rng.gen_range(0..n - 1);
        if recipient >= sender {
            recipient += 1;
        }
        (DelegateId::from_u128(sender + 1), DelegateId::from_u128(recipient + 1))
    }
}

fn check(name: &str, passed: bool) -> InvariantCheck {
    InvariantCheck {
        name: name.to_string(),
        passed,
    }
}

fn describe(trigger: &MatchingTrigger) -> String {
    match trigger {
        MatchingTrigger::NotDue => "not_due".to_string(),
        MatchingTrigger::ZeroPool => "zero_pool".to_string(),
        MatchingTrigger::AlreadyComputed => "already_computed".to_string(),
        MatchingTrigger::Computed(outcome) => format!("computed:{}", outcome.rows_written()),
    }
}
