//! Error types for safecount
//!
//! Provides error handling for:
//! - Critical-section acquisition failures (lock strategy)
//! - Mailbox backpressure (actor strategy)
//! - Contract violations (misuse of a counter)
//! - Configuration loading
//! - Workload orchestration

use std::path::PathBuf;

/// Errors returned by counter operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CounterError {
    /// The mutual-exclusion primitive could not be acquired
    #[error("critical section unavailable after waiting {waited_ms}ms")]
    ResourceUnavailable {
        /// How long the caller waited before giving up
        waited_ms: u64,
    },

    /// Bounded mailbox rejected the message
    #[error("mailbox full (capacity: {capacity})")]
    QueueFull {
        /// Configured mailbox capacity
        capacity: usize,
    },

    /// The counter was used in a way its contract forbids
    #[error("contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),
}

impl CounterError {
    /// Check if the caller may retry the same operation
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    /// Check if the error signals misuse rather than a runtime condition
    #[inline]
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation(_))
    }
}

/// Misuse of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    /// Increment issued after the counter was shut down
    #[error("increment issued after shutdown")]
    IncrementAfterShutdown,

    /// Owner thread is gone although shutdown was never requested
    #[error("counter owner exited without a shutdown request")]
    OwnerLost,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error while reading a config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`crate::CounterConfig`]
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds an unusable value
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Workload harness errors
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// The OS refused to spawn a worker thread
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        /// Index of the worker
        worker: usize,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A worker panicked before finishing its order
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked {
        /// Index of the worker
        worker: usize,
        /// Panic payload, when it was a string
        message: String,
    },

    /// Reading the final value failed
    #[error("counter error: {0}")]
    Counter(#[from] CounterError),
}
