//! Unsynchronized baseline
//!
//! [`RacyCounter`] reads and writes its value as two separate steps with no
//! critical section, so concurrent increments can overwrite each other. It
//! exists to make lost updates observable next to the safe strategies and is
//! never handed out by [`crate::create_counter`].

use crate::counter::Counter;
use crate::error::CounterError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(any(test, feature = "test-hooks"))]
use crate::hooks::CriticalSectionHooks;

/// Counter with a non-atomic read-modify-write
///
/// Every access uses `Relaxed`: the load and the store are individually
/// atomic, but nothing orders them against other increments.
#[derive(Debug, Clone, Default)]
pub struct RacyCounter {
    value: Arc<AtomicU64>,
    #[cfg(any(test, feature = "test-hooks"))]
    hooks: CriticalSectionHooks,
}

impl RacyCounter {
    /// Create a counter at zero
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install instrumentation run between the read and the write
    #[cfg(any(test, feature = "test-hooks"))]
    #[must_use]
    pub fn with_hooks(mut self, hooks: CriticalSectionHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl Counter for RacyCounter {
    fn increment(&self) -> Result<(), CounterError> {
        let current = self.value.load(Ordering::Relaxed);

        #[cfg(any(test, feature = "test-hooks"))]
        self.hooks.pause();

        self.value.store(current + 1, Ordering::Relaxed);
        Ok(())
    }

    fn value(&self) -> Result<u64, CounterError> {
        Ok(self.value.load(Ordering::Relaxed))
    }

    fn name(&self) -> &'static str {
        "racy"
    }
}
