//! Error taxonomy for the optimization engine.

use std::time::Duration;

use thiserror::Error as ThisError;

/// Location of a data row: payload index and 1-based data row within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRef {
    pub payload: usize,
    pub row: usize,
}

impl std::fmt::Display for RowRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "payload {} row {}", self.payload, self.row)
    }
}

/// Reasons a set of payloads is rejected before any batch work starts.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum ValidationError {
    #[error("payload {payload} is empty or lacks a header")]
    EmptyInput { payload: usize },
    #[error("schema mismatch in payload {payload}: missing {missing:?}, found {found:?}")]
    SchemaMismatch {
        payload: usize,
        missing: Vec<String>,
        found: Vec<String>,
    },
    #[error("duplicate delivery_id {delivery_id} at {at} (first seen at {first})")]
    DuplicateKey {
        delivery_id: u64,
        first: RowRef,
        at: RowRef,
    },
    #[error("column {column} at {at}: {reason}")]
    TypeViolation {
        column: String,
        at: RowRef,
        reason: String,
    },
    #[error("column {column} at {at}: {value} is outside [{min}, {max}]")]
    RangeViolation {
        column: String,
        at: RowRef,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("unparseable timestamp {value:?} at {at}")]
    TimestampViolation { at: RowRef, value: String },
    #[error("malformed row at {at}: {message}")]
    MalformedRow { at: RowRef, message: String },
}

/// A coordinate the UTM transform rejected or could not represent.
#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("EPSG:{epsg}: {message}")]
pub struct ProjectionError {
    pub epsg: u32,
    pub message: String,
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("batch {batch}: {message}")]
    BatchData { batch: usize, message: String },
    #[error("batch {batch} contains no pickup nodes")]
    NoPickupNodes { batch: usize },
    #[error("batch {batch} exceeded its deadline of {timeout:?}")]
    BatchTimeout { batch: usize, timeout: Duration },
    #[error("engine error: {0}")]
    Engine(String),
    #[error("ingest failed: {0}")]
    Ingest(String),
    #[error("storage failed: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Whether another attempt of the same call could succeed.
    ///
    /// Only failures of the compute layer itself qualify. Anything derived
    /// from the input data fails identically on every attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Engine(_) | Self::BatchTimeout { .. })
    }

    /// Short machine-friendly name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::BatchData { .. } => "batch_data",
            Self::NoPickupNodes { .. } => "no_pickup_nodes",
            Self::BatchTimeout { .. } => "batch_timeout",
            Self::Engine(_) => "engine",
            Self::Ingest(_) => "ingest",
            Self::Storage(_) => "storage",
        }
    }
}

/// Failure of a single batch, before the executor attaches the batch index.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BatchError {
    Data(String),
    NoPickupNodes,
    Timeout(Duration),
    /// A sibling batch failed first; never surfaced to callers.
    Cancelled,
}

impl BatchError {
    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub(crate) fn in_batch(self, batch: usize) -> Error {
        match self {
            Self::Data(message) => Error::BatchData { batch, message },
            Self::NoPickupNodes => Error::NoPickupNodes { batch },
            Self::Timeout(timeout) => Error::BatchTimeout { batch, timeout },
            Self::Cancelled => Error::Engine(format!("batch {batch} was cancelled")),
        }
    }
}
