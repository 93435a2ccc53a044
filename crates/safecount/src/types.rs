//! Core types for safecount
//!
//! - Counter identifiers
//! - Strategy selection
//! - Work orders
//! - Mailbox overflow policy

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ulid::Ulid;

/// Unique counter identifier, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CounterId(pub Ulid);

impl CounterId {
    /// Generate new counter ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for CounterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CounterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a counter protects its value from lost updates
///
/// Chosen at construction time and fixed for the counter's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Mutual exclusion around the read/compute/write sequence
    #[default]
    Lock,
    /// Single owner thread applying queued messages
    Actor,
}

impl Strategy {
    /// All strategies, in a stable order
    pub const ALL: [Strategy; 2] = [Strategy::Lock, Strategy::Actor];

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Actor => "actor",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lock" => Ok(Self::Lock),
            "actor" => Ok(Self::Actor),
            other => Err(format!("unknown strategy '{other}' (expected 'lock' or 'actor')")),
        }
    }
}

/// Number of increments a single worker must apply
///
/// Immutable once issued; consumed by exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    increments: u64,
}

impl WorkOrder {
    /// Create a work order. Zero is allowed and is a no-op.
    #[inline]
    #[must_use]
    pub fn new(increments: u64) -> Self {
        Self { increments }
    }

    /// Increments to apply
    #[inline]
    #[must_use]
    pub fn increments(&self) -> u64 {
        self.increments
    }
}

/// What a bounded mailbox does when it is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail the send with `QueueFull`
    #[default]
    Reject,
    /// Suspend the sender until space frees up
    Block,
}
