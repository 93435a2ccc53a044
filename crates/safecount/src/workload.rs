//! Workload harness
//!
//! Spawns N workers, hands each one a [`WorkOrder`], joins them all and reads
//! the final value. Thread management sits behind [`Spawn`] so the harness
//! only relies on `spawn(worker) -> handle` and `join(handle)`.

use crate::counter::Counter;
use crate::error::{CounterError, WorkloadError};
use crate::types::WorkOrder;
use serde::Serialize;
use std::any::Any;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// What one worker achieved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerOutcome {
    /// Increments the counter accepted
    pub applied: u64,
    /// Increments never applied because the worker gave up
    pub failed: u64,
    /// Retries spent on `QueueFull`
    pub retried: u64,
    /// Error that stopped the worker, if any
    pub error: Option<CounterError>,
}

/// Starts and joins workers
pub trait Spawn {
    /// Handle to a running worker
    type Handle;

    /// Start `work` as worker number `worker`
    ///
    /// # Errors
    /// - `WorkloadError::Spawn` if the worker could not be started
    fn spawn<F>(&self, worker: usize, work: F) -> Result<Self::Handle, WorkloadError>
    where
        F: FnOnce() -> WorkerOutcome + Send + 'static;

    /// Wait for a worker to finish
    ///
    /// # Errors
    /// - `WorkloadError::WorkerPanicked` if the worker panicked
    fn join(&self, worker: usize, handle: Self::Handle) -> Result<WorkerOutcome, WorkloadError>;
}

/// Runs each worker on its own named OS thread
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    name_prefix: String,
}

impl ThreadSpawner {
    /// Create spawner naming threads `{prefix}-{index}`
    #[inline]
    #[must_use]
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
        }
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new("safecount-worker")
    }
}

impl Spawn for ThreadSpawner {
    type Handle = JoinHandle<WorkerOutcome>;

    fn spawn<F>(&self, worker: usize, work: F) -> Result<Self::Handle, WorkloadError>
    where
        F: FnOnce() -> WorkerOutcome + Send + 'static,
    {
        std::thread::Builder::new()
            .name(format!("{}-{worker}", self.name_prefix))
            .spawn(work)
            .map_err(|source| WorkloadError::Spawn { worker, source })
    }

    fn join(&self, worker: usize, handle: Self::Handle) -> Result<WorkerOutcome, WorkloadError> {
        handle.join().map_err(|payload| WorkloadError::WorkerPanicked {
            worker,
            message: panic_message(payload.as_ref()),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Bounded exponential backoff for `QueueFull`
///
/// Applied by workers, never by the counter itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries per increment (not counting the first attempt)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 8,
            initial_backoff: Duration::from_micros(50),
            max_backoff: Duration::from_millis(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based)
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}

/// Apply one increment, retrying `QueueFull` per `retry`
fn increment_with_retry<C: Counter + ?Sized>(
    counter: &C,
    retry: Option<&RetryPolicy>,
    retried: &mut u64,
) -> Result<(), CounterError> {
    let mut attempt = 0;
    loop {
        match counter.increment() {
            Err(err) if err.is_retryable() => match retry {
                Some(policy) if attempt < policy.max_retries => {
                    std::thread::sleep(policy.backoff(attempt));
                    attempt += 1;
                    *retried += 1;
                }
                _ => return Err(err),
            },
            other => return other,
        }
    }
}

/// Consume a work order against `counter`
///
/// Stops at the first error that survives retrying; the rest of the order is
/// counted as failed.
pub fn run_order<C: Counter + ?Sized>(
    counter: &C,
    order: WorkOrder,
    retry: Option<&RetryPolicy>,
) -> WorkerOutcome {
    let mut outcome = WorkerOutcome::default();
    for _ in 0..order.increments() {
        match increment_with_retry(counter, retry, &mut outcome.retried) {
            Ok(()) => outcome.applied += 1,
            Err(err) => {
                outcome.failed = order.increments() - outcome.applied;
                outcome.error = Some(err);
                break;
            }
        }
    }
    outcome
}

/// W workers, K increments each
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    workers: usize,
    increments_per_worker: u64,
    retry: Option<RetryPolicy>,
}

impl Workload {
    /// Create workload
    #[inline]
    #[must_use]
    pub fn new(workers: usize, increments_per_worker: u64) -> Self {
        Self {
            workers,
            increments_per_worker,
            retry: None,
        }
    }

    /// Let workers retry `QueueFull`
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Number of workers
    #[inline]
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Increments per worker
    #[inline]
    #[must_use]
    pub fn increments_per_worker(&self) -> u64 {
        self.increments_per_worker
    }

    /// One order per worker
    #[must_use]
    pub fn orders(&self) -> Vec<WorkOrder> {
        vec![WorkOrder::new(self.increments_per_worker); self.workers]
    }

    /// Final value a lost-update-free counter must report
    #[must_use]
    pub fn expected(&self) -> u64 {
        (self.workers as u64).saturating_mul(self.increments_per_worker)
    }

    /// Run on OS threads
    ///
    /// # Errors
    /// Same as [`Self::run_with`].
    pub fn run<C>(&self, counter: &C) -> Result<WorkloadReport, WorkloadError>
    where
        C: Counter + Clone + 'static,
    {
        self.run_with(&ThreadSpawner::default(), counter)
    }

    /// Run with a custom spawner
    ///
    /// # Errors
    /// - `WorkloadError::Spawn` if a worker could not be started
    /// - `WorkloadError::WorkerPanicked` if a worker panicked
    /// - `WorkloadError::Counter` if the final read failed
    pub fn run_with<S, C>(&self, spawner: &S, counter: &C) -> Result<WorkloadReport, WorkloadError>
    where
        S: Spawn,
        C: Counter + Clone + 'static,
    {
        tracing::info!(
            counter = counter.name(),
            workers = self.workers,
            increments_per_worker = self.increments_per_worker,
            "workload starting"
        );
        let started = Instant::now();

        let mut handles = Vec::with_capacity(self.workers);
        for (worker, order) in self.orders().into_iter().enumerate() {
            let counter = counter.clone();
            let retry = self.retry;
            match spawner.spawn(worker, move || run_order(&counter, order, retry.as_ref())) {
                Ok(handle) => handles.push((worker, handle)),
                Err(err) => {
                    // Join what already runs so no worker outlives the workload.
                    for (worker, handle) in handles {
                        let _ = spawner.join(worker, handle);
                    }
                    return Err(err);
                }
            }
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        let mut first_error = None;
        for (worker, handle) in handles {
            match spawner.join(worker, handle) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    tracing::error!(worker, error = %err, "worker failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let final_value = counter.value()?;
        let report = WorkloadReport {
            counter: counter.name().to_string(),
            workers: self.workers,
            increments_per_worker: self.increments_per_worker,
            expected: self.expected(),
            final_value,
            applied: outcomes.iter().map(|o| o.applied).sum(),
            failed_increments: outcomes.iter().map(|o| o.failed).sum(),
            retried_increments: outcomes.iter().map(|o| o.retried).sum(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        if report.is_exact() {
            tracing::info!(counter = %report.counter, final_value, elapsed_ms = report.elapsed_ms, "workload finished");
        } else {
            tracing::warn!(
                counter = %report.counter,
                final_value,
                expected = report.expected,
                failed = report.failed_increments,
                "workload finished short"
            );
        }
        Ok(report)
    }
}

/// Result of one workload run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadReport {
    /// Counter name (`lock`, `actor`, `racy`)
    pub counter: String,
    /// Number of workers
    pub workers: usize,
    /// Increments per worker
    pub increments_per_worker: u64,
    /// `workers * increments_per_worker`
    pub expected: u64,
    /// Value read after all workers joined
    pub final_value: u64,
    /// Increments the counter accepted
    pub applied: u64,
    /// Increments abandoned after an error
    pub failed_increments: u64,
    /// Retries spent on `QueueFull`
    pub retried_increments: u64,
    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

impl WorkloadReport {
    /// Final value equals the expected value
    #[inline]
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.final_value == self.expected
    }

    /// Increments accepted but missing from the final value
    #[inline]
    #[must_use]
    pub fn lost_updates(&self) -> u64 {
        self.applied.saturating_sub(self.final_value)
    }

    /// Human readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        format!(
            "{counter}: {workers} workers x {k} increments\n  expected:    {expected}\n  final value: {value}\n  lost:        {lost}\n  failed:      {failed}\n  retried:     {retried}\n  elapsed:     {elapsed}ms",
            counter = self.counter,
            workers = self.workers,
            k = self.increments_per_worker,
            expected = self.expected,
            value = self.final_value,
            lost = self.lost_updates(),
            failed = self.failed_increments,
            retried = self.retried_increments,
            elapsed = self.elapsed_ms,
        )
    }
}
