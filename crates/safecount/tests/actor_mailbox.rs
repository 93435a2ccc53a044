//! Actor mailbox behaviour under backpressure and shutdown.

use safecount::prelude::*;
use safecount::{ContractViolation, CounterError};
use safecount_test_utils::{
    assert_exact, bounded_actor, configured_actor, patient_retry, run_workload,
};
use std::thread;

#[test]
fn blocking_mailbox_never_loses_increments() {
    let counter = bounded_actor(1, OverflowPolicy::Block);
    let report = run_workload(&counter, 4, 2_000);
    counter.shutdown();

    assert_exact(&report);
    assert_eq!(report.retried_increments, 0);
}

#[test]
fn rejecting_mailbox_with_retry_is_exact() {
    let counter = configured_actor(2, OverflowPolicy::Reject);
    let report = Workload::new(4, 2_000)
        .with_retry(patient_retry())
        .run(&counter)
        .unwrap();
    counter.shutdown();

    assert_exact(&report);
}

#[test]
fn rejecting_mailbox_without_retry_accounts_for_every_increment() {
    let counter = bounded_actor(1, OverflowPolicy::Reject);
    let report = run_workload(&counter, 4, 5_000);
    counter.shutdown();

    // Whatever was rejected is reported, never silently dropped.
    assert_eq!(report.applied + report.failed_increments, report.expected);
    assert_eq!(report.final_value, report.applied);
}

#[test]
fn queue_full_is_retryable() {
    let err = CounterError::QueueFull { capacity: 1 };
    assert!(err.is_retryable());
    assert!(!err.is_contract_violation());
}

#[test]
fn value_after_shutdown_is_stable() {
    let counter = create_counter(Strategy::Actor);
    let report = run_workload(&counter, 3, 1_000);
    assert_exact(&report);

    counter.shutdown();
    assert_eq!(counter.value().unwrap(), 3_000);
    assert_eq!(counter.value().unwrap(), 3_000);
}

#[test]
fn shutdown_from_any_clone_stops_all() {
    let counter = create_counter(Strategy::Actor);
    let clone = counter.clone();
    counter.increment().unwrap();

    thread::spawn(move || clone.shutdown()).join().unwrap();

    assert_eq!(
        counter.increment(),
        Err(CounterError::ContractViolation(
            ContractViolation::IncrementAfterShutdown
        ))
    );
    assert_eq!(counter.value().unwrap(), 1);
}

#[test]
fn concurrent_shutdown_calls_are_safe() {
    let counter = create_counter(Strategy::Actor);
    for _ in 0..100 {
        counter.increment().unwrap();
    }

    let closers: Vec<_> = (0..4)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || counter.shutdown())
        })
        .collect();
    for closer in closers {
        closer.join().unwrap();
    }

    assert_eq!(counter.value().unwrap(), 100);
}

#[test]
fn dropping_last_handle_stops_owner() {
    let counter = create_counter(Strategy::Actor);
    for _ in 0..10 {
        counter.increment().unwrap();
    }
    // Drop joins the owner thread; the test would hang if it did not exit.
    drop(counter);
}
