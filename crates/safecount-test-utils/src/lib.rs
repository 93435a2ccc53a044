//! Testing utilities for the safecount workspace
//!
//! Shared fixtures for integration tests: instrumented counters, bounded
//! actors and workload shortcuts.

#![allow(missing_docs)]

use safecount::hooks::{CriticalSectionHooks, ExhaustionSwitch};
use safecount::{
    create_counter, create_counter_with, ActorConfig, ActorCounter, Counter, CounterConfig,
    CounterHandle, LockCounter, OverflowPolicy, RacyCounter, RetryPolicy, Strategy, Workload,
    WorkloadReport,
};

/// One fresh counter per strategy
pub fn all_strategies() -> Vec<CounterHandle> {
    Strategy::ALL.into_iter().map(create_counter).collect()
}

/// Lock counter that yields between read and write, maximising interleaving
pub fn racing_lock_counter() -> CounterHandle {
    LockCounter::new()
        .with_hooks(CriticalSectionHooks::new().yield_between_read_and_write())
        .into()
}

/// Unsynchronized baseline that yields between read and write
pub fn racing_racy_counter() -> RacyCounter {
    RacyCounter::new().with_hooks(CriticalSectionHooks::new().yield_between_read_and_write())
}

/// Lock counter whose critical section fails while the returned switch is engaged
pub fn exhaustible_lock_counter() -> (CounterHandle, ExhaustionSwitch) {
    let switch = ExhaustionSwitch::new();
    let counter = LockCounter::new()
        .with_hooks(CriticalSectionHooks::new().exhaust_when(&switch))
        .into();
    (counter, switch)
}

/// Actor counter with a bounded mailbox
pub fn bounded_actor(capacity: usize, overflow: OverflowPolicy) -> CounterHandle {
    ActorCounter::with_config(&ActorConfig {
        mailbox_capacity: Some(capacity),
        overflow,
    })
    .into()
}

/// Actor counter built through the public config path
pub fn configured_actor(capacity: usize, overflow: OverflowPolicy) -> CounterHandle {
    create_counter_with(
        &CounterConfig::new()
            .with_strategy(Strategy::Actor)
            .with_mailbox_capacity(capacity)
            .with_overflow(overflow),
    )
}

/// Retry policy that effectively never gives up
pub fn patient_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: u32::MAX,
        initial_backoff: std::time::Duration::from_micros(10),
        max_backoff: std::time::Duration::from_millis(1),
    }
}

/// Run `workers` x `increments` and return the report; panics on harness failure
pub fn run_workload<C: Counter + Clone + 'static>(
    counter: &C,
    workers: usize,
    increments: u64,
) -> WorkloadReport {
    Workload::new(workers, increments)
        .run(counter)
        .expect("workload should run")
}

/// Assert that a report accounts for every increment
pub fn assert_exact(report: &WorkloadReport) {
    assert!(
        report.is_exact(),
        "expected {} but counted {}\n{}",
        report.expected,
        report.final_value,
        report.generate_text()
    );
    assert_eq!(report.failed_increments, 0, "{}", report.generate_text());
}
