//! Fixed-size slicing of the combined dataset into batches.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A contiguous row range of the combined dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub index: usize,
    pub offset: usize,
    pub len: usize,
}

impl Batch {
    /// Exclusive end row.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// The rows covered by this batch, or `None` if `rows` is too short.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> Option<&'a [T]> {
        rows.get(self.offset..self.end())
    }
}

/// Split `total_rows` into `ceil(total_rows / batch_size)` ordered batches.
///
/// Every batch but the last holds exactly `batch_size` rows.
pub fn partition(total_rows: usize, batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(Error::configuration("batch_size must be a positive integer"));
    }

    let batches = (0..total_rows.div_ceil(batch_size))
        .map(|index| {
            let offset = index * batch_size;
            Batch {
                index,
                offset,
                len: batch_size.min(total_rows - offset),
            }
        })
        .collect();
    Ok(batches)
}
