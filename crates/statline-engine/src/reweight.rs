// Two-pass reliability reweighting for rate stats with a per-player denominator.

use crate::zscore::{compute_column_stats, standardize, PoolStats, STDEV_EPSILON};

/// Output of the reliability pass for one rate category.
#[derive(Debug, Clone, PartialEq)]
pub struct ReliabilityScores {
    /// Plain population stats of the raw rate values.
    pub raw: PoolStats,
    /// Stats of the volume-weighted intermediate values.
    pub intermediate: PoolStats,
    /// Final re-standardized scores, before any polarity inversion.
    pub scores: Vec<Option<f64>>,
}

/// Volume-weighted deviation: `(raw - mean) / (stdev / sqrt(volume))`.
///
/// Zero when the raw column has no spread. A non-positive volume cannot reach
/// this point because the qualifier removes it.
pub fn weighted_intermediate(raw: f64, volume: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (raw - stats.mean) * volume.sqrt() / stats.stdev
}

/// Score a rate column against usage volume.
///
/// 1. Plain mean/stdev of the present raw values.
/// 2. Per-row weighted intermediate.
/// 3. Re-standardize the intermediates over the same population.
///
/// `values` and `volumes` are parallel; missing raw cells stay missing.
pub fn reliability_scores(values: &[Option<f64>], volumes: &[f64]) -> ReliabilityScores {
    debug_assert_eq!(values.len(), volumes.len());
    let raw = compute_column_stats(values);
    let intermediates: Vec<Option<f64>> = values
        .iter()
        .zip(volumes)
        .map(|(v, &vol)| v.map(|x| weighted_intermediate(x, vol, &raw)))
        .collect();
    let (intermediate, scores) = standardize(&intermediates);
    ReliabilityScores {
        raw,
        intermediate,
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zscore::compute_pool_stats;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn intermediate_scales_with_sqrt_volume() {
        let stats = PoolStats {
            mean: 4.0,
            stdev: 2.0,
        };
        assert!(approx_eq(weighted_intermediate(6.0, 100.0, &stats), 10.0, 1e-10));
        assert!(approx_eq(weighted_intermediate(6.0, 25.0, &stats), 5.0, 1e-10));
        assert!(approx_eq(weighted_intermediate(2.0, 4.0, &stats), -2.0, 1e-10));
    }

    #[test]
    fn zero_spread_gives_zero_scores() {
        let out = reliability_scores(&[Some(3.0), Some(3.0), Some(3.0)], &[10.0, 50.0, 200.0]);
        assert_eq!(out.scores, vec![Some(0.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn result_is_standardized() {
        let values = [Some(2.5), Some(3.1), Some(4.8), Some(5.9), Some(3.7)];
        let volumes = [180.0, 65.0, 22.0, 140.0, 90.0];
        let out = reliability_scores(&values, &volumes);
        let present: Vec<f64> = out.scores.iter().flatten().copied().collect();
        let stats = compute_pool_stats(&present);
        assert!(approx_eq(stats.mean, 0.0, 1e-9));
        assert!(approx_eq(stats.stdev, 1.0, 1e-9));
    }

    #[test]
    fn more_volume_moves_same_rate_further_in_its_direction() {
        // Players 0 and 1 share a raw value above the mean; 2 and 3 share one below.
        let values = [Some(5.0), Some(5.0), Some(3.0), Some(3.0), Some(4.0)];
        let volumes = [200.0, 20.0, 200.0, 20.0, 100.0];
        let out = reliability_scores(&values, &volumes);
        let s: Vec<f64> = out.scores.iter().flatten().copied().collect();
        assert!(s[0] > s[1]);
        assert!(s[2] < s[3]);
    }

    #[test]
    fn missing_raw_value_is_skipped() {
        let out = reliability_scores(&[Some(1.0), None, Some(3.0)], &[4.0, 9.0, 4.0]);
        assert!(out.scores[1].is_none());
        assert!(approx_eq(out.raw.mean, 2.0, 1e-10));
        assert!(approx_eq(out.scores[0].unwrap(), -1.0, 1e-10));
        assert!(approx_eq(out.scores[2].unwrap(), 1.0, 1e-10));
    }
}
