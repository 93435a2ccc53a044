//! Log subscriber setup for the `safecount` binary
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary (or to whoever embeds the library).

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Subscriber setup errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The level/directive string is not a valid filter
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// A global subscriber is already installed
    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Build the filter: `RUST_LOG` wins, `default_directive` otherwise
///
/// # Errors
/// - `LoggingError::Filter` if neither `RUST_LOG` nor `default_directive` parses
pub fn filter(default_directive: &str) -> Result<EnvFilter, LoggingError> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))?)
}

/// Install the global subscriber, writing to stderr
///
/// # Errors
/// - `LoggingError::Filter` if the filter cannot be built
/// - `LoggingError::Init` if a global subscriber is already installed
pub fn init(default_directive: &str, format: LogFormat) -> Result<(), LoggingError> {
    let filter = filter(default_directive)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.finish().try_init()?,
        LogFormat::Json => builder.json().finish().try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_level_names() {
        assert!(EnvFilter::try_new("warn").is_ok());
        assert!(EnvFilter::try_new("safecount=debug,info").is_ok());
    }

    #[test]
    fn rejects_garbage_directive() {
        assert!(matches!(
            EnvFilter::try_new("safecount=notalevel").map_err(LoggingError::from),
            Err(LoggingError::Filter(_))
        ));
    }
}
