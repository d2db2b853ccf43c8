//! End-to-end engine scenarios
//!
//! A full process lifecycle through the public API: transfers during
//! Delegation, estimates, the first read after the conversation opens,
//! and late transfers.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use matching_engine::{MatchingConfig, MatchingEngine, MatchingRule, PhaseResolver};
use persistence::{InMemoryLedger, InMemoryMatchStore, InMemoryProcessRegistry, MatchStore, ProcessRegistry};
use types::ids::{DelegateId, ProcessId};
use types::numeric::Amount;
use types::process::{PhaseSchedule, Process, ProcessStatus};
use types::transfer::CandidateTransfer;

fn t1() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap()
}

fn t2() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 10, 10, 0, 0).unwrap()
}

struct Round {
    ledger: Arc<InMemoryLedger>,
    registry: Arc<InMemoryProcessRegistry>,
    store: Arc<InMemoryMatchStore>,
    resolver: PhaseResolver,
    process_id: ProcessId,
}

impl Round {
    fn new(pool: &str, rule: MatchingRule) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let registry = Arc::new(InMemoryProcessRegistry::new());
        let store = Arc::new(InMemoryMatchStore::new());
        let engine = MatchingEngine::new(
            ledger.clone(),
            registry.clone(),
            store.clone(),
            MatchingConfig { rule, precision: 2 },
        );

        let phases = PhaseSchedule::new(t1(), t2()).unwrap();
        let process = Process::new("Community round", Decimal::from_str(pool).unwrap(), phases, t1() - Duration::days(14)).unwrap();
        let process_id = process.process_id;
        registry.insert(process).unwrap();

        Self {
            ledger,
            registry,
            store,
            resolver: PhaseResolver::new(Arc::new(engine)),
            process_id,
        }
    }

    fn candidate(&self, sender: u128, recipient: u128, amount: &str) -> CandidateTransfer {
        CandidateTransfer::new(
            self.process_id,
            DelegateId::from_u128(sender),
            DelegateId::from_u128(recipient),
            Decimal::from_str(amount).unwrap(),
        )
    }

    fn give(&self, sender: u128, recipient: u128, amount: &str, at: DateTime<Utc>) {
        let c = self.candidate(sender, recipient, amount);
        self.resolver.engine().record_transfer(self.ledger.as_ref(), &c, at).unwrap();
    }

    fn matched(&self, recipient: u128) -> Amount {
        self.store.get(&self.process_id, &DelegateId::from_u128(recipient)).unwrap()
    }
}

#[test]
fn test_full_lifecycle() {
    let round = Round::new("100", MatchingRule::Proportional);
    let early = t1() - Duration::days(3);

    round.give(1, 10, "30", early);
    round.give(2, 11, "70", early);

    // Still delegating: nothing committed
    assert_eq!(round.resolver.resolve_status(&round.process_id, early).unwrap(), ProcessStatus::Delegation);
    assert_eq!(round.matched(10), Amount::ZERO);

    // First read of the conversation commits matches
    assert_eq!(round.resolver.resolve_status(&round.process_id, t1()).unwrap(), ProcessStatus::Deliberation);
    assert_eq!(round.matched(10), Amount::from_u64(30));
    assert_eq!(round.matched(11), Amount::from_u64(70));
    assert_eq!(
        round.registry.get(&round.process_id).unwrap().unwrap().status,
        ProcessStatus::Deliberation
    );

    // A late transfer oversubscribes the pool and rescales on the next read
    round.give(3, 12, "100", t1() + Duration::hours(2));
    round.resolver.resolve_status(&round.process_id, t1() + Duration::hours(3)).unwrap();
    assert_eq!(round.matched(10), Amount::from_u64(15));
    assert_eq!(round.matched(11), Amount::from_u64(35));
    assert_eq!(round.matched(12), Amount::from_u64(50));

    assert_eq!(round.resolver.resolve_status(&round.process_id, t2()).unwrap(), ProcessStatus::Election);
    assert_eq!(round.store.list(&round.process_id).unwrap().len(), 3);
}

#[test]
fn test_estimate_before_and_after_commit() {
    let round = Round::new("100", MatchingRule::Proportional);
    round.give(1, 10, "30", t1() - Duration::days(1));

    let engine = round.resolver.engine();
    let estimate = engine.estimate_match(&round.candidate(2, 10, "20")).unwrap();
    assert_eq!(estimate.current_match, Amount::from_u64(30));
    assert_eq!(estimate.estimated_match, Amount::from_u64(50));
    assert_eq!(estimate.delta, Decimal::from(20));
    assert!(round.store.is_empty());

    round.resolver.resolve_status(&round.process_id, t1()).unwrap();

    // Oversubscribing candidate: the recipient's share is scaled
    let estimate = engine.estimate_match(&round.candidate(3, 10, "170")).unwrap();
    assert_eq!(estimate.estimated_match, Amount::from_u64(100));
    assert_eq!(round.matched(10), Amount::from_u64(30));
}

#[test]
fn test_participant_view_after_matching() {
    let round = Round::new("40", MatchingRule::Proportional);
    let early = t1() - Duration::days(2);
    round.give(1, 10, "30", early);
    round.give(10, 11, "50", early + Duration::minutes(1));

    round.resolver.resolve_status(&round.process_id, t1()).unwrap();

    let summary = round
        .resolver
        .engine()
        .participant_summary(&round.process_id, &DelegateId::from_u128(10))
        .unwrap();
    assert_eq!(summary.transfers.len(), 2);
    assert_eq!(summary.sent, Amount::from_u64(50));
    assert_eq!(summary.received, Amount::from_u64(30));
    assert_eq!(summary.committed_match, Amount::from_u64(15));

    // Someone who never took part sees nothing and a zero match
    let stranger = round
        .resolver
        .engine()
        .participant_summary(&round.process_id, &DelegateId::from_u128(99))
        .unwrap();
    assert!(stranger.transfers.is_empty());
    assert_eq!(stranger.committed_match, Amount::ZERO);
}

#[test]
fn test_quadratic_rewards_breadth() {
    let round = Round::new("1000", MatchingRule::Quadratic);
    let early = t1() - Duration::days(1);

    // Recipient 10: four senders of 25; recipient 11: one sender of 100
    for s in 1..=4 {
        round.give(s, 10, "25", early);
    }
    round.give(5, 11, "100", early);

    round.resolver.resolve_status(&round.process_id, t1()).unwrap();
    // (4 × 5)² − 100 = 300; (10)² − 100 = 0
    assert_eq!(round.matched(10), Amount::from_u64(300));
    assert_eq!(round.matched(11), Amount::ZERO);
}

#[test]
fn test_amounts_near_decimal_max_stay_within_pool() {
    let round = Round::new("100", MatchingRule::Proportional);
    let early = t1() - Duration::days(1);
    let huge = "50000000000000000000000000000";

    // Three recipients whose combined demand overflows a Decimal
    round.give(1, 10, huge, early);
    round.give(2, 11, huge, early);
    round.give(3, 12, huge, early);
    // Same sender twice: the per-sender total overflows too
    round.give(4, 13, huge, early);
    round.give(4, 13, huge, early);

    round.resolver.resolve_status(&round.process_id, t1()).unwrap();

    let rows = round.store.list(&round.process_id).unwrap();
    let total: Amount = rows.iter().map(|p| p.amount).sum();
    assert_eq!(rows.len(), 4);
    assert_eq!(total, Amount::from_u64(100));
    assert!(rows.iter().all(|p| p.amount <= Amount::from_u64(100)));

    let summary = round
        .resolver
        .engine()
        .participant_summary(&round.process_id, &DelegateId::from_u128(4))
        .unwrap();
    assert_eq!(summary.sent.as_decimal(), Decimal::MAX);

    let estimate = round.resolver.engine().estimate_match(&round.candidate(5, 10, huge)).unwrap();
    assert!(estimate.estimated_match <= Amount::from_u64(100));
}

#[test]
fn test_out_of_range_precision_does_not_break_matching() {
    let ledger = Arc::new(InMemoryLedger::new());
    let registry = Arc::new(InMemoryProcessRegistry::new());
    let store = Arc::new(InMemoryMatchStore::new());
    let engine = MatchingEngine::new(
        ledger.clone(),
        registry.clone(),
        store.clone(),
        MatchingConfig {
            rule: MatchingRule::Proportional,
            precision: 30,
        },
    );

    let phases = PhaseSchedule::new(t1(), t2()).unwrap();
    let process = Process::new("Wide precision", Decimal::from(10), phases, t1()).unwrap();
    registry.insert(process.clone()).unwrap();
    let c = CandidateTransfer::new(process.process_id, DelegateId::from_u128(1), DelegateId::from_u128(2), Decimal::from(30));
    engine.record_transfer(ledger.as_ref(), &c, t1()).unwrap();

    let outcome = engine.match_transfers_at(&process, t1()).unwrap();
    assert_eq!(outcome.distributed(), Amount::from_u64(10));
}
