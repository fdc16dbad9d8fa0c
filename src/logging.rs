//! Structured logging setup.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, OptimizerConfig};
use crate::error::{Error, Result};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Calling this again,
/// or after another subscriber was installed, leaves the existing one alone.
pub fn init_logging(config: &OptimizerConfig) -> Result<()> {
    if LOGGER_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| Error::configuration(format!("invalid log_level {:?}: {e}", config.log_level)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true);

    let installed = match config.log_format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already set, keeping it");
    }
    let _ = LOGGER_INITIALIZED.set(());

    tracing::debug!(
        batch_size = config.batch_size,
        worker_threads = config.worker_threads(),
        log_format = ?config.log_format,
        "Logging initialized"
    );
    Ok(())
}
