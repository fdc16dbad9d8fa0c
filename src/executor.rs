//! Parallel execution of batch optimizations on a fixed-size pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::error::{BatchError, Error, Result};
use crate::partition::Batch;
use crate::record::{DeliveryRecord, OptimizedRoute};
use crate::tour::{self, Interrupt};

#[derive(Debug)]
pub struct BatchExecutor {
    pool: rayon::ThreadPool,
    batch_timeout: Option<Duration>,
}

impl BatchExecutor {
    /// Available parallelism minus one, never less than one.
    pub fn default_worker_threads() -> usize {
        thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1)
    }

    pub fn new(worker_threads: usize, batch_timeout: Option<Duration>) -> Result<Self> {
        if worker_threads == 0 {
            return Err(Error::configuration("worker_threads must be at least 1"));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|idx| format!("batch-worker-{idx}"))
            .build()
            .map_err(|e| Error::engine(format!("failed to build worker pool: {e}")))?;

        Ok(Self { pool, batch_timeout })
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Optimize every batch and concatenate the results in batch order.
    ///
    /// The first failing batch (lowest index) is reported. Once any batch
    /// fails, batches still running stop at their next check.
    pub fn execute(&self, records: &[DeliveryRecord], batches: &[Batch]) -> Result<Vec<OptimizedRoute>> {
        let slices = batches
            .iter()
            .map(|batch| {
                batch.slice(records).map(|rows| (batch.index, rows)).ok_or_else(|| {
                    Error::configuration(format!(
                        "batch {} covers rows {}..{} but the dataset has {} rows",
                        batch.index,
                        batch.offset,
                        batch.end(),
                        records.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            batches = slices.len(),
            workers = self.worker_threads(),
            "Starting parallel optimization"
        );

        let cancelled = AtomicBool::new(false);
        let timeout = self.batch_timeout;

        let results: Vec<(usize, std::result::Result<Vec<OptimizedRoute>, BatchError>)> = self.pool.install(|| {
            slices
                .par_iter()
                .map(|&(index, rows)| {
                    let started = Instant::now();
                    let interrupt = Interrupt::new(&cancelled, timeout);
                    let result = tour::optimize_batch_with(index, rows, &interrupt);

                    match &result {
                        Ok(routes) => tracing::debug!(
                            batch = index,
                            routes = routes.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Batch finished"
                        ),
                        Err(BatchError::Cancelled) => {
                            tracing::debug!(batch = index, "Batch cancelled after sibling failure")
                        }
                        Err(err) => {
                            cancelled.store(true, Ordering::Relaxed);
                            tracing::error!(batch = index, error = ?err, "Batch optimization failed");
                        }
                    }
                    (index, result)
                })
                .collect()
        });

        let mut optimized = Vec::with_capacity(records.len());
        let mut first_error = None;
        for (index, result) in results {
            match result {
                Ok(routes) => optimized.extend(routes),
                Err(BatchError::Cancelled) => {}
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err.in_batch(index));
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        if cancelled.load(Ordering::Relaxed) {
            return Err(Error::engine("batches were cancelled without a reported failure"));
        }
        Ok(optimized)
    }
}
