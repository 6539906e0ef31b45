//! Logging initialisation via tracing-subscriber.
//!
//! [`init`] is called once at startup. Level precedence is decided by the
//! caller: `-v` flags force a fixed level, otherwise `RUST_LOG` wins over
//! the configured level.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Initialise the global tracing subscriber with output on stderr, keeping
/// stdout clean for the pipeline result.
///
/// With `force_level` the given `level` is used as-is (CLI `-v` flags);
/// otherwise `RUST_LOG` takes precedence and `level` is the fallback.
pub fn init(level: &str, force_level: bool) -> Result<(), AppError> {
    let filter = if force_level {
        EnvFilter::try_new(level)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))
    }
    .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}
