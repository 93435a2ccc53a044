//! Counter configuration
//!
//! A [`CounterConfig`] selects the strategy and carries the per-strategy
//! knobs. It can be built in code or loaded from TOML:
//!
//! ```toml
//! strategy = "actor"
//!
//! [lock]
//! acquire_timeout_ms = 250
//!
//! [actor]
//! mailbox_capacity = 1024
//! overflow = "block"
//! ```

use crate::error::ConfigError;
use crate::types::{OverflowPolicy, Strategy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Counter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CounterConfig {
    /// Strategy used by counters built from this config
    pub strategy: Strategy,
    /// Lock strategy settings
    pub lock: LockConfig,
    /// Actor strategy settings
    pub actor: ActorConfig,
}

impl CounterConfig {
    /// Create default configuration (lock strategy, blocking acquire)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// With a bound on how long `increment` waits for the lock
    #[inline]
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.lock.acquire_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// With a bounded actor mailbox
    #[inline]
    #[must_use]
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.actor.mailbox_capacity = Some(capacity);
        self
    }

    /// With mailbox overflow policy
    #[inline]
    #[must_use]
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.actor.overflow = overflow;
        self
    }

    /// Parse configuration from TOML text and validate it
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the text is not valid TOML for this schema
    /// - `ConfigError::Invalid` if a value fails [`Self::validate`]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file and validate it
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` and `ConfigError::Invalid` as for [`Self::from_toml_str`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        tracing::debug!(path = %path.display(), "loaded counter config");
        Self::from_toml_str(&text)
    }

    /// Check values that deserialize fine but cannot be honoured
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if `actor.mailbox_capacity` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actor.mailbox_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "actor.mailbox_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lock strategy settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Give up acquiring the critical section after this many milliseconds.
    /// `None` blocks until the lock is free.
    pub acquire_timeout_ms: Option<u64>,
}

impl LockConfig {
    /// Acquire timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}

/// Actor strategy settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActorConfig {
    /// Mailbox capacity; `None` means unbounded
    pub mailbox_capacity: Option<usize>,
    /// Behaviour of a full bounded mailbox
    pub overflow: OverflowPolicy,
}
