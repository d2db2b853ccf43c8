//! Concurrency test
//!
//! Verifies that many threads resolving the same process compute matches
//! once and leave exactly one row per recipient, and that different
//! processes resolve independently.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::{Arc, Barrier};
use std::thread;

use matching_engine::{MatchingConfig, MatchingEngine, MatchingTrigger, PhaseResolver};
use persistence::{InMemoryLedger, InMemoryMatchStore, InMemoryProcessRegistry, MatchStore};
use types::ids::{DelegateId, ProcessId};
use types::numeric::Amount;
use types::process::{PhaseSchedule, Process, ProcessStatus};
use types::transfer::CandidateTransfer;

fn conversation_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap()
}

struct World {
    ledger: Arc<InMemoryLedger>,
    registry: Arc<InMemoryProcessRegistry>,
    store: Arc<InMemoryMatchStore>,
    resolver: Arc<PhaseResolver>,
}

fn world() -> World {
    let ledger = Arc::new(InMemoryLedger::new());
    let registry = Arc::new(InMemoryProcessRegistry::new());
    let store = Arc::new(InMemoryMatchStore::new());
    let engine = MatchingEngine::new(
        ledger.clone(),
        registry.clone(),
        store.clone(),
        MatchingConfig::default(),
    );
    World {
        ledger,
        registry,
        store,
        resolver: Arc::new(PhaseResolver::new(Arc::new(engine))),
    }
}

fn seed_process(w: &World, pool: u64, recipients: u128) -> ProcessId {
    let phases = PhaseSchedule::new(conversation_start(), conversation_start() + Duration::days(7)).unwrap();
    let process = Process::new("Concurrent round", Decimal::from(pool), phases, conversation_start() - Duration::days(7)).unwrap();
    let process_id = process.process_id;
    w.registry.insert(process).unwrap();

    for r in 0..recipients {
        for s in 0..3u128 {
            let candidate = CandidateTransfer::new(
                process_id,
                DelegateId::from_u128(10_000 + s),
                DelegateId::from_u128(r),
                Decimal::from(10 + r as u64),
            );
            w.resolver
                .engine()
                .record_transfer(w.ledger.as_ref(), &candidate, conversation_start() - Duration::hours(1))
                .unwrap();
        }
    }
    process_id
}

#[test]
fn test_concurrent_reads_compute_once() {
    let w = world();
    let process_id = seed_process(&w, 500, 20);
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let resolver = w.resolver.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let at = conversation_start() + Duration::seconds(i as i64);
                resolver.resolve(&process_id, at).unwrap()
            })
        })
        .collect();

    let resolutions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let computed = resolutions
        .iter()
        .filter(|r| matches!(r.matching, MatchingTrigger::Computed(_)))
        .count();
    assert_eq!(computed, 1);
    assert!(resolutions.iter().all(|r| r.status == ProcessStatus::Deliberation));

    let rows = w.store.list(&process_id).unwrap();
    assert_eq!(rows.len(), 20);
    let total: Amount = rows.iter().map(|p| p.amount).sum();
    assert_eq!(total, Amount::from_u64(500));
}

#[test]
fn test_independent_processes_resolve_in_parallel() {
    let w = world();
    let processes: Vec<ProcessId> = (0..4).map(|i| seed_process(&w, 100 * (i + 1), 5)).collect();

    let handles: Vec<_> = processes
        .iter()
        .map(|pid| {
            let resolver = w.resolver.clone();
            let pid = *pid;
            thread::spawn(move || resolver.resolve_status(&pid, conversation_start() + Duration::days(7)).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ProcessStatus::Election);
    }

    for pid in &processes {
        assert_eq!(w.store.list(pid).unwrap().len(), 5);
    }
}

#[test]
fn test_concurrent_results_are_deterministic() {
    // Same ledger shape resolved in two isolated worlds
    let run = || {
        let w = world();
        let pid = seed_process(&w, 77, 9);
        w.resolver.resolve_status(&pid, conversation_start()).unwrap();
        w.store
            .list(&pid)
            .unwrap()
            .into_iter()
            .map(|p| (p.recipient, p.amount))
            .collect::<Vec<_>>()
    };

    let h1 = thread::spawn(run);
    let h2 = thread::spawn(run);
    assert_eq!(h1.join().unwrap(), h2.join().unwrap());
}
