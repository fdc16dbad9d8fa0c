//! batch-router core
//!
//! Validates delivery payloads, splits them into fixed-size batches, and
//! orders each batch with a greedy nearest-neighbor walk over its
//! pickup/dropoff graph, running batches in parallel.

pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod logging;
pub mod optimizer;
pub mod partition;
pub mod projection;
pub mod record;
pub mod retry;
pub mod schema;
pub mod tour;
pub mod traits;

pub use config::OptimizerConfig;
pub use error::{Error, Result, ValidationError};
pub use optimizer::{RouteOptimizer, optimize_routes};
pub use record::{DeliveryRecord, GeoPoint, OptimizedRoute};
