//! End-to-end route optimization: validate, partition, execute, with retry.

use std::time::Instant;

use crate::config::OptimizerConfig;
use crate::error::{Error, Result};
use crate::executor::BatchExecutor;
use crate::partition::partition;
use crate::record::OptimizedRoute;
use crate::schema::SchemaValidator;
use crate::traits::{PayloadSource, RouteSink};

#[derive(Debug)]
pub struct RouteOptimizer {
    config: OptimizerConfig,
    validator: SchemaValidator,
    executor: BatchExecutor,
}

impl RouteOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        let executor = BatchExecutor::new(config.worker_threads(), config.batch_timeout())?;
        let validator = SchemaValidator::new(config.required_columns.clone());
        Ok(Self {
            config,
            validator,
            executor,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize all payloads into one ordered route list.
    ///
    /// Validation runs over the combined payloads before any batch is
    /// dispatched. Only transient failures are retried.
    pub fn optimize<S: AsRef<str>>(&self, payloads: &[S]) -> Result<Vec<OptimizedRoute>> {
        if payloads.is_empty() {
            return Err(Error::configuration("at least one payload is required"));
        }
        self.config
            .retry
            .run("optimize_routes", |attempt| self.optimize_once(payloads, attempt))
    }

    fn optimize_once<S: AsRef<str>>(&self, payloads: &[S], attempt: u32) -> Result<Vec<OptimizedRoute>> {
        let started = Instant::now();
        tracing::debug!(payloads = payloads.len(), attempt, "Validating payloads");

        let mut records = self.validator.validate(payloads)?;
        if self.config.sort_by_delivery_id {
            records.sort_by_key(|record| record.delivery_id);
        }

        let batches = partition(records.len(), self.config.batch_size)?;
        tracing::info!(
            total_rows = records.len(),
            batches = batches.len(),
            batch_size = self.config.batch_size,
            attempt,
            "Starting route optimization"
        );

        let routes = self.executor.execute(&records, &batches)?;

        tracing::info!(
            routes = routes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Route optimization completed"
        );
        Ok(routes)
    }

    /// Fetch from `source`, optimize, and hand the routes to `sink`.
    ///
    /// Returns the number of stored routes.
    pub fn run<P, R>(&self, source: &P, sink: &mut R) -> Result<usize>
    where
        P: PayloadSource + ?Sized,
        R: RouteSink + ?Sized,
    {
        let payloads = source.fetch().map_err(|e| Error::Ingest(e.to_string()))?;
        tracing::info!(payloads = payloads.len(), "Ingested payloads");

        let routes = self.optimize(payloads.as_slice())?;
        sink.store(&routes).map_err(|e| Error::Storage(e.to_string()))?;

        tracing::info!(routes = routes.len(), "Stored optimized routes");
        Ok(routes.len())
    }
}

/// Optimize `payloads` with default settings and the given batch size.
pub fn optimize_routes<S: AsRef<str>>(payloads: &[S], batch_size: usize) -> Result<Vec<OptimizedRoute>> {
    RouteOptimizer::new(OptimizerConfig::with_batch_size(batch_size))?.optimize(payloads)
}
