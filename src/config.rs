//! Optimizer configuration.
//!
//! Values come from `OptimizerConfig::default()` overlaid with environment
//! variables prefixed `ROUTE_OPT_`. Nested keys use `__`, for example
//! `ROUTE_OPT_RETRY__MAX_ATTEMPTS=5`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::executor::BatchExecutor;
use crate::retry::RetryPolicy;
use crate::schema::REQUIRED_COLUMNS;

const ENV_PREFIX: &str = "ROUTE_OPT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Maximum rows per batch.
    pub batch_size: usize,
    /// Columns every payload must carry. Must include the core schema.
    pub required_columns: Vec<String>,
    /// Worker pool size. Defaults to available parallelism minus one.
    pub worker_threads: Option<usize>,
    /// Per-batch deadline in milliseconds.
    pub batch_timeout_ms: Option<u64>,
    /// Sort the combined dataset by `delivery_id` before partitioning.
    pub sort_by_delivery_id: bool,
    pub retry: RetryPolicy,
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            worker_threads: None,
            batch_timeout_ms: None,
            sort_by_delivery_id: false,
            retry: RetryPolicy::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl OptimizerConfig {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    /// Load from the process environment and validate.
    pub fn from_env() -> Result<Self> {
        Self::from_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    pub(crate) fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let loaded: Self = config::Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::configuration(format!("failed to load configuration: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::configuration("batch_size must be a positive integer"));
        }
        if self.worker_threads == Some(0) {
            return Err(Error::configuration("worker_threads must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::configuration("retry.max_attempts must be at least 1"));
        }
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|core| !self.required_columns.iter().any(|c| c == core))
            .collect();
        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "required_columns must include {missing:?}"
            )));
        }
        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(BatchExecutor::default_worker_threads)
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}
