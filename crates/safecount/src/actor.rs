//! Actor strategy
//!
//! The value is owned by one dedicated thread (the owner). Handles never touch
//! it; they only send messages through a multi-producer single-consumer
//! mailbox:
//! - `Increment`: fire-and-forget, applied in dequeue order
//! - `Query`: answered with the value as of the moment it is dequeued
//! - `Shutdown`: the owner drains what is already enqueued, then exits
//!
//! Workers must finish sending before any of them shuts the counter down.
//! Messages racing with `Shutdown` may be dropped unseen.

use crate::config::ActorConfig;
use crate::counter::Counter;
use crate::error::{ContractViolation, CounterError};
use crate::types::{CounterId, OverflowPolicy, Strategy};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Messages sent to the owner
#[derive(Debug)]
enum Message {
    /// Add one to the value
    Increment,
    /// Report the current value on the reply channel
    Query(Sender<u64>),
    /// Drain the mailbox and exit
    Shutdown,
}

/// Owner thread lifecycle
#[derive(Debug)]
enum OwnerState {
    /// Owner is consuming messages
    Running(JoinHandle<u64>),
    /// Owner exited after a shutdown request
    Stopped { final_value: u64 },
    /// Owner exited on its own (panicked)
    Lost,
}

/// Counter whose value is owned by a single thread
#[derive(Debug)]
pub struct ActorCounter {
    id: CounterId,
    mailbox: Sender<Message>,
    capacity: Option<usize>,
    overflow: OverflowPolicy,
    shut_down: AtomicBool,
    owner: Mutex<OwnerState>,
}

impl ActorCounter {
    /// Create a counter at zero with an unbounded mailbox
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&ActorConfig::default())
    }

    /// Create a counter at zero from config and spawn its owner
    #[must_use]
    pub fn with_config(config: &ActorConfig) -> Self {
        let id = CounterId::new();
        let (tx, rx) = match config.mailbox_capacity {
            Some(capacity) => channel::bounded(capacity),
            None => channel::unbounded(),
        };
        let owner = std::thread::spawn(move || run_owner(id, &rx));

        tracing::debug!(
            counter_id = %id,
            mailbox_capacity = ?config.mailbox_capacity,
            overflow = ?config.overflow,
            "created actor counter"
        );

        Self {
            id,
            mailbox: tx,
            capacity: config.mailbox_capacity,
            overflow: config.overflow,
            shut_down: AtomicBool::new(false),
            owner: Mutex::new(OwnerState::Running(owner)),
        }
    }

    /// Counter ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> CounterId {
        self.id
    }

    /// Whether shutdown has been requested
    #[inline]
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Enqueue a message according to the overflow policy
    fn send(&self, message: Message) -> Result<(), CounterError> {
        match (self.capacity, self.overflow) {
            (Some(capacity), OverflowPolicy::Reject) => match self.mailbox.try_send(message) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => Err(CounterError::QueueFull { capacity }),
                Err(TrySendError::Disconnected(_)) => Err(self.disconnected()),
            },
            _ => self.mailbox.send(message).map_err(|_| self.disconnected()),
        }
    }

    fn disconnected(&self) -> CounterError {
        if self.is_shut_down() {
            self.violation(ContractViolation::IncrementAfterShutdown)
        } else {
            self.violation(ContractViolation::OwnerLost)
        }
    }

    fn violation(&self, violation: ContractViolation) -> CounterError {
        tracing::error!(counter_id = %self.id, %violation, "counter contract violated");
        violation.into()
    }

    /// Value recorded when the owner stopped
    fn final_value(&self) -> Result<u64, CounterError> {
        match &*self.owner.lock() {
            OwnerState::Stopped { final_value } => Ok(*final_value),
            OwnerState::Running(_) | OwnerState::Lost => {
                Err(self.violation(ContractViolation::OwnerLost))
            }
        }
    }
}

impl Default for ActorCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for ActorCounter {
    fn increment(&self) -> Result<(), CounterError> {
        if self.is_shut_down() {
            return Err(self.violation(ContractViolation::IncrementAfterShutdown));
        }
        self.send(Message::Increment)
    }

    fn value(&self) -> Result<u64, CounterError> {
        if !self.is_shut_down() {
            let (reply_tx, reply_rx) = channel::bounded(1);
            // Queries wait for mailbox space regardless of the overflow policy.
            if self.mailbox.send(Message::Query(reply_tx)).is_ok() {
                if let Ok(value) = reply_rx.recv() {
                    return Ok(value);
                }
            }
        }
        // Owner stopped (or is stopping): the shutdown caller holds the owner
        // lock until the final value is recorded.
        self.final_value()
    }

    fn shutdown(&self) {
        let mut owner = self.owner.lock();
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let _ = self.mailbox.send(Message::Shutdown);

        *owner = match std::mem::replace(&mut *owner, OwnerState::Lost) {
            OwnerState::Running(handle) => match handle.join() {
                Ok(final_value) => {
                    tracing::info!(counter_id = %self.id, final_value, "actor counter shut down");
                    OwnerState::Stopped { final_value }
                }
                Err(_) => {
                    tracing::error!(counter_id = %self.id, "counter owner panicked");
                    OwnerState::Lost
                }
            },
            other => other,
        };
    }

    fn name(&self) -> &'static str {
        Strategy::Actor.as_str()
    }
}

impl Drop for ActorCounter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Owner loop: the only code that ever touches the value
fn run_owner(id: CounterId, mailbox: &Receiver<Message>) -> u64 {
    let mut value: u64 = 0;

    while let Ok(message) = mailbox.recv() {
        match message {
            Message::Increment => value += 1,
            Message::Query(reply) => {
                let _ = reply.send(value);
            }
            Message::Shutdown => {
                let drained = drain(mailbox, &mut value);
                tracing::debug!(counter_id = %id, drained, value, "owner drained mailbox");
                return value;
            }
        }
    }

    // Every handle is gone without a shutdown message.
    value
}

/// Apply everything already enqueued, without waiting for more
fn drain(mailbox: &Receiver<Message>, value: &mut u64) -> u64 {
    let mut drained = 0;
    while let Ok(message) = mailbox.try_recv() {
        match message {
            Message::Increment => {
                *value += 1;
                drained += 1;
            }
            Message::Query(reply) => {
                let _ = reply.send(*value);
            }
            Message::Shutdown => {}
        }
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Counter whose owner is not running yet, so the mailbox fills up
    fn parked(capacity: usize, overflow: OverflowPolicy) -> (ActorCounter, Receiver<Message>) {
        let (tx, rx) = channel::bounded(capacity);
        let counter = ActorCounter {
            id: CounterId::new(),
            mailbox: tx,
            capacity: Some(capacity),
            overflow,
            shut_down: AtomicBool::new(false),
            owner: Mutex::new(OwnerState::Lost),
        };
        (counter, rx)
    }

    fn start_owner(counter: &ActorCounter, rx: Receiver<Message>) {
        let id = counter.id;
        let handle = thread::spawn(move || run_owner(id, &rx));
        *counter.owner.lock() = OwnerState::Running(handle);
    }

    #[test]
    fn starts_at_zero() {
        let counter = ActorCounter::new();
        assert_eq!(counter.value().unwrap(), 0);
        assert_eq!(counter.name(), "actor");
    }

    #[test]
    fn query_reflects_prior_increments() {
        let counter = ActorCounter::new();
        for _ in 0..10 {
            counter.increment().unwrap();
        }
        assert_eq!(counter.value().unwrap(), 10);
        assert_eq!(counter.value().unwrap(), 10);
    }

    #[test]
    fn shutdown_before_increment() {
        let counter = ActorCounter::new();
        counter.shutdown();

        assert!(counter.is_shut_down());
        assert_eq!(
            counter.increment(),
            Err(CounterError::ContractViolation(
                ContractViolation::IncrementAfterShutdown
            ))
        );
        assert_eq!(counter.value().unwrap(), 0);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let counter = ActorCounter::new();
        counter.increment().unwrap();
        counter.shutdown();
        counter.shutdown();
        assert_eq!(counter.value().unwrap(), 1);
    }

    #[test]
    fn shutdown_keeps_enqueued_increments() {
        let counter = ActorCounter::new();
        for _ in 0..1_000 {
            counter.increment().unwrap();
        }
        counter.shutdown();
        assert_eq!(counter.value().unwrap(), 1_000);
    }

    #[test]
    fn owner_drains_messages_behind_shutdown() {
        let (tx, rx) = channel::unbounded();
        tx.send(Message::Increment).unwrap();
        tx.send(Message::Shutdown).unwrap();
        tx.send(Message::Increment).unwrap();
        tx.send(Message::Increment).unwrap();

        let (reply_tx, reply_rx) = channel::bounded(1);
        tx.send(Message::Query(reply_tx)).unwrap();

        assert_eq!(run_owner(CounterId::new(), &rx), 3);
        assert_eq!(reply_rx.recv().unwrap(), 3);
    }

    #[test]
    fn owner_stops_when_handles_drop() {
        let (tx, rx) = channel::unbounded();
        tx.send(Message::Increment).unwrap();
        drop(tx);
        assert_eq!(run_owner(CounterId::new(), &rx), 1);
    }

    #[test]
    fn full_mailbox_rejects_then_recovers() {
        let (counter, rx) = parked(2, OverflowPolicy::Reject);

        counter.increment().unwrap();
        counter.increment().unwrap();
        assert_eq!(counter.increment(), Err(CounterError::QueueFull { capacity: 2 }));

        start_owner(&counter, rx);
        assert_eq!(counter.value().unwrap(), 2);

        counter.increment().unwrap();
        assert_eq!(counter.value().unwrap(), 3);
    }

    #[test]
    fn full_mailbox_blocks_sender() {
        let (counter, rx) = parked(1, OverflowPolicy::Block);
        let counter = Arc::new(counter);

        counter.increment().unwrap();
        let sender = {
            let counter = Arc::clone(&counter);
            thread::spawn(move || counter.increment())
        };

        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!sender.is_finished());

        start_owner(&counter, rx);
        sender.join().unwrap().unwrap();
        assert_eq!(counter.value().unwrap(), 2);
    }

    #[test]
    fn lost_owner_is_reported() {
        let (counter, rx) = parked(4, OverflowPolicy::Reject);
        drop(rx);

        assert_eq!(
            counter.increment(),
            Err(CounterError::ContractViolation(ContractViolation::OwnerLost))
        );
        assert_eq!(
            counter.value(),
            Err(CounterError::ContractViolation(ContractViolation::OwnerLost))
        );
    }

    #[test]
    fn concurrent_senders_lose_nothing() {
        let counter = Arc::new(ActorCounter::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        counter.increment().unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(counter.value().unwrap(), 8_000);
    }
}
