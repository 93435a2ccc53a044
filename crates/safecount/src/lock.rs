//! Lock strategy
//!
//! The value lives behind a `parking_lot::Mutex`. Each increment acquires the
//! lock, reads, computes, writes and releases. The guard's `Drop` releases the
//! lock on every exit path, so a failing or unwinding increment never leaves
//! the critical section held.

use crate::config::LockConfig;
use crate::counter::Counter;
use crate::error::CounterError;
use crate::types::{CounterId, Strategy};
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;

#[cfg(any(test, feature = "test-hooks"))]
use crate::hooks::CriticalSectionHooks;

/// Counter protected by a single mutual-exclusion lock
///
/// All increments form one total order equivalent to a serial execution.
#[derive(Debug)]
pub struct LockCounter {
    id: CounterId,
    value: Mutex<u64>,
    acquire_timeout: Option<Duration>,
    #[cfg(any(test, feature = "test-hooks"))]
    hooks: CriticalSectionHooks,
}

impl LockCounter {
    /// Create a counter at zero that blocks until the lock is free
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&LockConfig::default())
    }

    /// Create a counter at zero from config
    #[must_use]
    pub fn with_config(config: &LockConfig) -> Self {
        let counter = Self {
            id: CounterId::new(),
            value: Mutex::new(0),
            acquire_timeout: config.acquire_timeout(),
            #[cfg(any(test, feature = "test-hooks"))]
            hooks: CriticalSectionHooks::default(),
        };
        tracing::debug!(
            counter_id = %counter.id,
            acquire_timeout_ms = ?config.acquire_timeout_ms,
            "created lock counter"
        );
        counter
    }

    /// Install critical-section instrumentation
    #[cfg(any(test, feature = "test-hooks"))]
    #[must_use]
    pub fn with_hooks(mut self, hooks: CriticalSectionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Counter ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> CounterId {
        self.id
    }

    /// Enter the critical section
    fn acquire(&self) -> Result<MutexGuard<'_, u64>, CounterError> {
        #[cfg(any(test, feature = "test-hooks"))]
        if self.hooks.acquire_should_fail() {
            tracing::warn!(counter_id = %self.id, "critical section exhausted");
            return Err(CounterError::ResourceUnavailable { waited_ms: 0 });
        }

        match self.acquire_timeout {
            None => Ok(self.value.lock()),
            Some(timeout) => self.value.try_lock_for(timeout).ok_or_else(|| {
                let waited_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(counter_id = %self.id, waited_ms, "lock acquire timed out");
                CounterError::ResourceUnavailable { waited_ms }
            }),
        }
    }
}

impl Default for LockCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for LockCounter {
    fn increment(&self) -> Result<(), CounterError> {
        let mut guard = self.acquire()?;
        let current = *guard;

        #[cfg(any(test, feature = "test-hooks"))]
        self.hooks.pause();

        *guard = current + 1;
        Ok(())
    }

    fn value(&self) -> Result<u64, CounterError> {
        Ok(*self.value.lock())
    }

    fn name(&self) -> &'static str {
        Strategy::Lock.as_str()
    }
}
