//! Counter abstraction
//!
//! [`Counter`] is the seam every strategy implements. [`CounterHandle`] is the
//! cheap, cloneable handle callers share between workers; it fixes the
//! strategy at construction time.

use crate::actor::ActorCounter;
use crate::config::CounterConfig;
use crate::error::CounterError;
use crate::lock::LockCounter;
use crate::types::Strategy;
use std::sync::Arc;

/// A counter safe to increment from many threads at once
pub trait Counter: Send + Sync {
    /// Increase the value by exactly one
    ///
    /// # Errors
    /// - `CounterError::ResourceUnavailable` if the critical section could not be entered
    /// - `CounterError::QueueFull` if a bounded mailbox rejected the message
    /// - `CounterError::ContractViolation` if the counter was already shut down
    fn increment(&self) -> Result<(), CounterError>;

    /// Read the current value
    ///
    /// # Errors
    /// - `CounterError::ContractViolation` if the owning thread of an actor
    ///   counter died without a shutdown
    fn value(&self) -> Result<u64, CounterError>;

    /// Stop accepting increments. No-op unless the counter owns a thread.
    fn shutdown(&self) {}

    /// Short name used in logs and reports
    fn name(&self) -> &'static str;
}

/// Shared handle to a counter of either strategy
#[derive(Debug, Clone)]
pub struct CounterHandle {
    inner: Inner,
}

#[derive(Debug, Clone)]
enum Inner {
    Lock(Arc<LockCounter>),
    Actor(Arc<ActorCounter>),
}

impl CounterHandle {
    /// Strategy fixed at construction
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match &self.inner {
            Inner::Lock(_) => Strategy::Lock,
            Inner::Actor(_) => Strategy::Actor,
        }
    }

    fn counter(&self) -> &dyn Counter {
        match &self.inner {
            Inner::Lock(counter) => &**counter,
            Inner::Actor(counter) => &**counter,
        }
    }
}

impl Counter for CounterHandle {
    #[inline]
    fn increment(&self) -> Result<(), CounterError> {
        self.counter().increment()
    }

    #[inline]
    fn value(&self) -> Result<u64, CounterError> {
        self.counter().value()
    }

    fn shutdown(&self) {
        self.counter().shutdown();
    }

    fn name(&self) -> &'static str {
        self.strategy().as_str()
    }
}

impl From<LockCounter> for CounterHandle {
    fn from(counter: LockCounter) -> Self {
        Self {
            inner: Inner::Lock(Arc::new(counter)),
        }
    }
}

impl From<ActorCounter> for CounterHandle {
    fn from(counter: ActorCounter) -> Self {
        Self {
            inner: Inner::Actor(Arc::new(counter)),
        }
    }
}

/// Create a counter at zero with default settings for `strategy`
#[must_use]
pub fn create_counter(strategy: Strategy) -> CounterHandle {
    create_counter_with(&CounterConfig::new().with_strategy(strategy))
}

/// Create a counter at zero from config
#[must_use]
pub fn create_counter_with(config: &CounterConfig) -> CounterHandle {
    let handle: CounterHandle = match config.strategy {
        Strategy::Lock => LockCounter::with_config(&config.lock).into(),
        Strategy::Actor => ActorCounter::with_config(&config.actor).into(),
    };
    tracing::info!(strategy = %handle.strategy(), "counter created");
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn create_counter_fixes_strategy() {
        for strategy in Strategy::ALL {
            let counter = create_counter(strategy);
            assert_eq!(counter.strategy(), strategy);
            assert_eq!(counter.name(), strategy.as_str());
            assert_eq!(counter.value().unwrap(), 0);
            counter.shutdown();
        }
    }

    #[test]
    fn clones_share_state() {
        for strategy in Strategy::ALL {
            let counter = create_counter(strategy);
            let clone = counter.clone();
            clone.increment().unwrap();
            counter.increment().unwrap();
            assert_eq!(clone.value().unwrap(), 2);
            counter.shutdown();
        }
    }

    #[test]
    fn handles_cross_threads() {
        for strategy in Strategy::ALL {
            let counter = create_counter(strategy);
            let workers: Vec<_> = (0..3)
                .map(|_| {
                    let counter = counter.clone();
                    thread::spawn(move || {
                        for _ in 0..500 {
                            counter.increment().unwrap();
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }
            assert_eq!(counter.value().unwrap(), 1_500);
            counter.shutdown();
        }
    }

    #[test]
    fn config_selects_strategy() {
        let config = CounterConfig::new()
            .with_strategy(Strategy::Actor)
            .with_mailbox_capacity(8);
        let counter = create_counter_with(&config);
        assert_eq!(counter.strategy(), Strategy::Actor);
        counter.shutdown();
    }
}
