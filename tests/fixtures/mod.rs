//! Test fixtures for batch-router.
//!
//! Provides CSV payloads around lower Manhattan plus a generator for larger
//! deterministic datasets.

pub mod deliveries;

pub use deliveries::*;
