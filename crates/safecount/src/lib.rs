//! safecount - counters that never lose an update
//!
//! A counter incremented concurrently by many workers, offered through two
//! interchangeable strategies that yield the same exact final count:
//!
//! - [`LockCounter`]: mutual exclusion scoped tightly around the
//!   read/compute/write sequence
//! - [`ActorCounter`]: a single owner thread applies messages from a queue,
//!   one at a time; nothing is shared but the queue
//!
//! # Example
//!
//! ```rust
//! use safecount::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let counter = create_counter(Strategy::Actor);
//! let report = Workload::new(2, 1_000).run(&counter)?;
//! assert_eq!(report.final_value, 2_000);
//! counter.shutdown();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod actor;
pub mod config;
pub mod counter;
pub mod error;
pub mod lock;
pub mod logging;
pub mod racy;
pub mod types;
pub mod workload;

// Test instrumentation
#[cfg(any(test, feature = "test-hooks"))]
pub mod hooks;

// Re-exports for convenience
pub use actor::ActorCounter;
pub use config::{ActorConfig, CounterConfig, LockConfig};
pub use counter::{create_counter, create_counter_with, Counter, CounterHandle};
pub use error::{ConfigError, ContractViolation, CounterError, WorkloadError};
pub use lock::LockCounter;
pub use racy::RacyCounter;
pub use types::{CounterId, OverflowPolicy, Strategy, WorkOrder};
pub use workload::{RetryPolicy, Spawn, ThreadSpawner, WorkerOutcome, Workload, WorkloadReport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with safecount
    pub use crate::{
        create_counter, create_counter_with, Counter, CounterConfig, CounterError, CounterHandle,
        OverflowPolicy, RetryPolicy, Strategy, Workload, WorkloadReport,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
