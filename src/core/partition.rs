//! Block range partitioning
//!
//! A shard's sequence space `[low, high]` is cut into fixed-size chunks so
//! extraction can fan out. Every range is half-open except the last, which is
//! closed at `high` and absorbs the remainder.

use crate::domain::{Result, TxnExportError};
use serde::Serialize;
use std::fmt;

/// A contiguous run of sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockRange {
    /// First sequence number (inclusive)
    pub from: i64,
    /// Upper bound; inclusive only when `inclusive_end` is set
    pub to: i64,
    /// Set on the final range of a shard
    pub inclusive_end: bool,
}

impl BlockRange {
    /// Create a range
    pub fn new(from: i64, to: i64, inclusive_end: bool) -> Self {
        Self {
            from,
            to,
            inclusive_end,
        }
    }

    /// Whether a sequence number falls inside the range
    pub fn contains(&self, block: i64) -> bool {
        block >= self.from && if self.inclusive_end { block <= self.to } else { block < self.to }
    }

    /// Number of sequence numbers covered
    pub fn len(&self) -> u64 {
        let span = (self.to - self.from) as u64;
        if self.inclusive_end {
            span + 1
        } else {
            span
        }
    }

    /// Whether the range covers nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.inclusive_end { ']' } else { ')' };
        write!(f, "[{}, {}{}", self.from, self.to, close)
    }
}

/// Split `[low, high]` into ranges of `size` sequence numbers
///
/// The partition count is `ceil((high - low) / size)`, with a floor of one so
/// a single-block shard still yields `[low, low]`.
///
/// # Errors
///
/// Returns `InvalidBounds` when `low > high`, `Configuration` for a
/// non-positive `size`, and `Other` when `high - low` overflows.
pub fn partition(low: i64, high: i64, size: i64) -> Result<Vec<BlockRange>> {
    if low > high {
        return Err(TxnExportError::InvalidBounds { low, high });
    }
    if size <= 0 {
        return Err(TxnExportError::Configuration(format!(
            "partition size must be positive, got {size}"
        )));
    }

    let span = high.checked_sub(low).ok_or_else(|| {
        TxnExportError::Other(format!("sequence span {low}..{high} does not fit in i64"))
    })?;
    let total = (span / size + i64::from(span % size != 0)).max(1);

    let ranges = (1..=total)
        .map(|i| {
            if i == total {
                BlockRange::new(low + (i - 1) * size, high, true)
            } else {
                BlockRange::new(low + (i - 1) * size, low + i * size, false)
            }
        })
        .collect();

    Ok(ranges)
}
