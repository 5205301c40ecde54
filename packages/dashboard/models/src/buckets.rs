//! Farm-size buckets.
//!
//! A bucket is identified by its lower threshold in square metres. The
//! breakpoint list is kept sorted descending so the first threshold not
//! above a farm's area is the farm's bucket.

use serde::{Deserialize, Serialize};

/// Default farm-size breakpoints in square metres.
pub const DEFAULT_BREAKPOINTS: [u64; 3] = [100_000, 10_000, 0];

/// A farm-size bucket, identified by its lower threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaBucket(pub u64);

impl AreaBucket {
    /// Lower threshold of the bucket in square metres.
    #[must_use]
    pub const fn threshold(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AreaBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descending list of bucket thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct AreaBreakpoints {
    thresholds: Vec<u64>,
}

impl AreaBreakpoints {
    /// Builds a breakpoint list from thresholds in any order. Duplicates are
    /// dropped.
    #[must_use]
    pub fn new(thresholds: impl IntoIterator<Item = u64>) -> Self {
        let mut thresholds: Vec<u64> = thresholds.into_iter().collect();
        thresholds.sort_unstable_by(|a, b| b.cmp(a));
        thresholds.dedup();
        Self { thresholds }
    }

    /// Returns the bucket a cultivated area falls into, or `None` when the
    /// area is below the smallest threshold.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bucket_for(&self, area: f64) -> Option<AreaBucket> {
        self.thresholds
            .iter()
            .find(|&&threshold| threshold as f64 <= area)
            .map(|&threshold| AreaBucket(threshold))
    }

    /// All buckets, largest first.
    pub fn buckets(&self) -> impl Iterator<Item = AreaBucket> + '_ {
        self.thresholds.iter().map(|&threshold| AreaBucket(threshold))
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Whether no breakpoints are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Legend label for a bucket, e.g. `"10000-100000 ㎡"` or
    /// `">100000 ㎡"` for the largest.
    #[must_use]
    pub fn label(&self, bucket: AreaBucket) -> Option<String> {
        let idx = self.thresholds.iter().position(|&t| t == bucket.0)?;
        Some(if idx == 0 {
            format!(">{} \u{33A1}", bucket.0)
        } else {
            format!("{}-{} \u{33A1}", bucket.0, self.thresholds[idx - 1])
        })
    }
}

impl Default for AreaBreakpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BREAKPOINTS)
    }
}

impl From<Vec<u64>> for AreaBreakpoints {
    fn from(thresholds: Vec<u64>) -> Self {
        Self::new(thresholds)
    }
}

impl From<AreaBreakpoints> for Vec<u64> {
    fn from(breakpoints: AreaBreakpoints) -> Self {
        breakpoints.thresholds
    }
}
