// Population statistics and plain standard scores.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation for a single category across the qualified pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
pub const STDEV_EPSILON: f64 = 1e-9;

/// Compute mean and standard deviation for a slice of values.
///
/// Returns `PoolStats { mean: 0.0, stdev: 0.0 }` for an empty slice.
/// Uses the population standard deviation (N denominator): the qualified
/// pool is the whole population being ranked, not a sample of it.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Pool stats over the present entries of a column with missing cells.
pub fn compute_column_stats(values: &[Option<f64>]) -> PoolStats {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    compute_pool_stats(&present)
}

/// Compute a z-score given a value and pool stats.
///
/// Returns 0.0 if the standard deviation is approximately zero, so a
/// zero-variance category contributes nothing instead of NaN.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

/// Standardize a column. Missing cells stay missing.
pub fn standardize(values: &[Option<f64>]) -> (PoolStats, Vec<Option<f64>>) {
    let stats = compute_column_stats(values);
    let scores = values
        .iter()
        .map(|v| v.map(|x| compute_zscore(x, &stats)))
        .collect();
    (stats, scores)
}
