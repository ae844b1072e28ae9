//! Tracing setup for Lookout embedders.
//!
//! Console output honors `RUST_LOG` with a caller-supplied fallback
//! directive; an optional file layer captures everything at trace level for
//! post-hoc debugging of negotiation decisions.

use std::fs::{File, create_dir_all};
use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::LookoutError;

const DEBUG_LOG_FILE: &str = "lookout-last-run.log";

/// Initializes the global tracing subscriber.
///
/// `default_directive` applies when `RUST_LOG` is unset (e.g. `"info"` or
/// `"lookout_core=debug"`). When `logs_dir` is given, a full trace-level log
/// of the last run is written to `lookout-last-run.log` inside it,
/// overwriting the previous run.
///
/// # Errors
///
/// - `LookoutError::Io` - The logs directory or file cannot be created
/// - `LookoutError::Configuration` - A global subscriber is already set
pub fn init_tracing(default_directive: &str, logs_dir: Option<&Path>) -> crate::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let console_layer = fmt::layer().with_target(true).with_filter(console_filter);

    let registry = tracing_subscriber::registry().with(console_layer);

    match logs_dir {
        Some(dir) => {
            create_dir_all(dir)?;
            let log_file = File::create(dir.join(DEBUG_LOG_FILE))?;

            let file_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(EnvFilter::new("trace"));

            registry
                .with(file_layer)
                .try_init()
                .map_err(|error| LookoutError::Configuration {
                    reason: error.to_string(),
                })?;
        }
        None => {
            registry
                .try_init()
                .map_err(|error| LookoutError::Configuration {
                    reason: error.to_string(),
                })?;
        }
    }

    tracing::debug!("tracing initialized, default directive '{default_directive}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_debug_log_file() {
        let dir = tempfile::tempdir().expect("temp dir");

        init_tracing("info", Some(dir.path())).expect("first init succeeds");
        assert!(dir.path().join(DEBUG_LOG_FILE).exists());

        // The global subscriber is process-wide, so a second init must
        // report a configuration error instead of panicking.
        let second = init_tracing("info", None);
        assert!(matches!(second, Err(LookoutError::Configuration { .. })));
    }
}
