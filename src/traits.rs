//! Collaborator seams around the optimization core.
//!
//! Fetching raw payloads and persisting routes are owned by the application.
//! Implementations handle their own transport, encoding and retries.

use std::error::Error as StdError;

use crate::record::OptimizedRoute;

/// Boxed error type returned by collaborators.
pub type CollaboratorError = Box<dyn StdError + Send + Sync>;

/// Supplies decoded CSV payloads, each with a header row.
pub trait PayloadSource {
    fn fetch(&self) -> Result<Vec<String>, CollaboratorError>;
}

/// Persists optimized routes in the order given.
///
/// Geometry arrives in WGS84 longitude/latitude.
pub trait RouteSink {
    fn store(&mut self, routes: &[OptimizedRoute]) -> Result<(), CollaboratorError>;
}

/// Fixed in-memory payloads.
impl PayloadSource for Vec<String> {
    fn fetch(&self) -> Result<Vec<String>, CollaboratorError> {
        Ok(self.clone())
    }
}

/// Collects routes in memory.
impl RouteSink for Vec<OptimizedRoute> {
    fn store(&mut self, routes: &[OptimizedRoute]) -> Result<(), CollaboratorError> {
        self.extend_from_slice(routes);
        Ok(())
    }
}
