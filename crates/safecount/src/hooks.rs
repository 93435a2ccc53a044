//! Critical-section instrumentation
//!
//! Only compiled under `cfg(test)` or the `test-hooks` feature. Production
//! builds carry neither the hook fields nor the call sites.
//!
//! Two hooks exist:
//! - a pause between reading the old value and writing the new one, which
//!   widens the race window of an unsynchronized read-modify-write
//! - an acquire fault, which makes acquisition of the critical section fail
//!   as if the primitive were exhausted

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type PauseFn = Arc<dyn Fn() + Send + Sync>;
type FaultFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Hooks invoked around a counter's critical section
#[derive(Clone, Default)]
pub struct CriticalSectionHooks {
    between_read_and_write: Option<PauseFn>,
    acquire_fault: Option<FaultFn>,
}

impl CriticalSectionHooks {
    /// No hooks installed
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `pause` after the read and before the write
    #[must_use]
    pub fn with_pause(mut self, pause: impl Fn() + Send + Sync + 'static) -> Self {
        self.between_read_and_write = Some(Arc::new(pause));
        self
    }

    /// Yield the thread between read and write
    #[must_use]
    pub fn yield_between_read_and_write(self) -> Self {
        self.with_pause(std::thread::yield_now)
    }

    /// Sleep between read and write
    #[must_use]
    pub fn sleep_between_read_and_write(self, delay: Duration) -> Self {
        self.with_pause(move || std::thread::sleep(delay))
    }

    /// Fail acquisition whenever `fault` returns true
    #[must_use]
    pub fn with_acquire_fault(mut self, fault: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.acquire_fault = Some(Arc::new(fault));
        self
    }

    /// Fail acquisition while `switch` is engaged
    #[must_use]
    pub fn exhaust_when(self, switch: &ExhaustionSwitch) -> Self {
        let engaged = Arc::clone(&switch.engaged);
        self.with_acquire_fault(move || engaged.load(Ordering::SeqCst))
    }

    pub(crate) fn pause(&self) {
        if let Some(pause) = &self.between_read_and_write {
            pause();
        }
    }

    pub(crate) fn acquire_should_fail(&self) -> bool {
        self.acquire_fault.as_ref().is_some_and(|fault| fault())
    }
}

impl std::fmt::Debug for CriticalSectionHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriticalSectionHooks")
            .field("between_read_and_write", &self.between_read_and_write.is_some())
            .field("acquire_fault", &self.acquire_fault.is_some())
            .finish()
    }
}

/// Shared flag simulating exhaustion of the lock primitive
#[derive(Debug, Clone, Default)]
pub struct ExhaustionSwitch {
    engaged: Arc<AtomicBool>,
}

impl ExhaustionSwitch {
    /// Create a released switch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every acquisition fail
    pub fn engage(&self) {
        self.engaged.store(true, Ordering::SeqCst);
    }

    /// Let acquisitions succeed again
    pub fn release(&self) {
        self.engaged.store(false, Ordering::SeqCst);
    }

    /// Whether acquisitions currently fail
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}
