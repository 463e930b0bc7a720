use rayon::prelude::*;
use tracing::debug;

use metriscope_core::Series;

use crate::error::RankError;

/// Per-series outcome of a detection run, index-aligned with the input
/// batch. `interval_count` is the number of disjoint runs of consecutive
/// outlying instants ("outlier strength"); `is_outlier` is true when at
/// least one such run exists. Series dropped during the time-axis join
/// report as non-outliers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlierReport {
    pub is_outlier: Vec<bool>,
    pub interval_count: Vec<usize>,
}

impl OutlierReport {
    fn none(len: usize) -> Self {
        Self {
            is_outlier: vec![false; len],
            interval_count: vec![0; len],
        }
    }
}

/// Seam for the density-clustering capability. The engine treats any error
/// from `detect` — unavailable host capability or an unexpected runtime
/// failure — as a signal to fall back to dispersion ranking.
pub trait OutlierDetector: Send + Sync {
    fn detect(&self, batch: &[Series]) -> Result<OutlierReport, RankError>;
}

/// DBSCAN-based outlier detector.
///
/// The batch is joined on its time axis (the first series defines the axis
/// length; series of a different length or with no values at all are
/// dropped rather than rejected). At every instant the present values are
/// clustered with one-dimensional DBSCAN; noise points are outlying
/// instants for their series. A series' strength is the number of maximal
/// runs of consecutive outlying instants.
#[derive(Debug, Clone)]
pub struct DbscanDetector {
    sensitivity: f64,
}

impl DbscanDetector {
    /// `sensitivity` in [0, 1]: 0 flags nothing, 1 is maximally strict.
    /// Values outside the range are clamped.
    pub fn new(sensitivity: f64) -> Self {
        Self {
            sensitivity: sensitivity.clamp(0.0, 1.0),
        }
    }
}

impl Default for DbscanDetector {
    fn default() -> Self {
        // Moderate strictness.
        Self::new(0.5)
    }
}

impl OutlierDetector for DbscanDetector {
    fn detect(&self, batch: &[Series]) -> Result<OutlierReport, RankError> {
        if batch.is_empty() {
            return Err(RankError::EmptyBatch);
        }
        let axis_len = batch[0].len();

        // Join on the time axis: keep only series that align with it and
        // carry at least one value.
        let joined: Vec<usize> = batch
            .iter()
            .enumerate()
            .filter(|(_, s)| s.len() == axis_len && s.values.len() == axis_len && !s.is_all_null())
            .map(|(i, _)| i)
            .collect();
        if axis_len == 0 || joined.len() < 2 {
            // A lone series has no peers to deviate from.
            return Ok(OutlierReport::none(batch.len()));
        }

        let spread = value_spread(batch, &joined);
        if spread == 0.0 {
            return Ok(OutlierReport::none(batch.len()));
        }
        // Sensitivity shrinks the neighborhood radius: at 0 every value is
        // within eps of every other, at 1 the radius approaches zero.
        let eps = spread * (1.0 - self.sensitivity).max(0.01);
        let min_pts = joined.len() / 2 + 1;

        // Instants are independent, so cluster them in parallel.
        let outlying_at: Vec<Vec<usize>> = (0..axis_len)
            .into_par_iter()
            .map(|t| {
                let points: Vec<(usize, f64)> = joined
                    .iter()
                    .filter_map(|&i| batch[i].values[t].map(|v| (i, v)))
                    .collect();
                if points.len() < min_pts {
                    // Too few present values to assess density.
                    return Vec::new();
                }
                dbscan_noise(points, eps, min_pts)
            })
            .collect();

        // Coalesce per-instant flags into disjoint intervals per series.
        let mut outlying = vec![vec![false; axis_len]; batch.len()];
        for (t, indices) in outlying_at.iter().enumerate() {
            for &i in indices {
                outlying[i][t] = true;
            }
        }
        let interval_count: Vec<usize> = outlying.iter().map(|mask| count_runs(mask)).collect();
        let is_outlier: Vec<bool> = interval_count.iter().map(|&c| c > 0).collect();

        debug!(
            series = batch.len(),
            joined = joined.len(),
            outliers = is_outlier.iter().filter(|&&o| o).count(),
            "dbscan outlier detection complete"
        );
        Ok(OutlierReport {
            is_outlier,
            interval_count,
        })
    }
}

/// Max minus min over every non-null value of the joined series.
fn value_spread(batch: &[Series], joined: &[usize]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &i in joined {
        for v in batch[i].non_null_values() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

/// One-dimensional DBSCAN returning only the noise points.
///
/// A point is core when at least `min_pts` points (itself included) lie
/// within `eps`; non-core points within `eps` of a core point are border
/// points of that cluster. Everything else is noise. Sorting the values
/// makes each neighborhood a contiguous window, so neighbor counting is a
/// two-pointer sweep instead of a pairwise distance matrix.
fn dbscan_noise(mut points: Vec<(usize, f64)>, eps: f64, min_pts: usize) -> Vec<usize> {
    points.sort_by(|a, b| a.1.total_cmp(&b.1));
    let n = points.len();

    // Neighborhood window [lo, hi) per point.
    let mut windows = Vec::with_capacity(n);
    let mut lo = 0;
    let mut hi = 0;
    for i in 0..n {
        let v = points[i].1;
        while points[lo].1 < v - eps {
            lo += 1;
        }
        while hi < n && points[hi].1 <= v + eps {
            hi += 1;
        }
        windows.push((lo, hi));
    }

    let core: Vec<bool> = windows.iter().map(|&(lo, hi)| hi - lo >= min_pts).collect();

    // Prefix sums over core flags for O(1) "any core in window" checks.
    let mut core_prefix = vec![0usize; n + 1];
    for i in 0..n {
        core_prefix[i + 1] = core_prefix[i] + usize::from(core[i]);
    }

    points
        .iter()
        .zip(windows.iter())
        .zip(core.iter())
        .filter_map(|(((series, _), &(lo, hi)), &is_core)| {
            let reachable = core_prefix[hi] - core_prefix[lo] > 0;
            (!is_core && !reachable).then_some(*series)
        })
        .collect()
}

/// Number of maximal runs of `true` in a mask.
fn count_runs(mask: &[bool]) -> usize {
    let mut runs = 0;
    let mut inside = false;
    for &flag in mask {
        if flag && !inside {
            runs += 1;
        }
        inside = flag;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(label: &str, values: &[f64]) -> Series {
        let timestamps: Vec<i64> = (0..values.len() as i64).map(|i| i * 60).collect();
        Series::new(label, values.iter().map(|&v| Some(v)).collect(), timestamps).unwrap()
    }

    fn flat_batch_with_spike() -> Vec<Series> {
        vec![
            series("a", &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
            series("b", &[1.1, 1.0, 1.1, 1.0, 1.1, 1.0]),
            series("c", &[0.9, 1.0, 0.9, 1.0, 0.9, 1.0]),
            series("d", &[1.0, 1.1, 1.0, 0.9, 1.0, 1.1]),
            series("spike", &[1.0, 1.0, 80.0, 80.0, 1.0, 90.0]),
        ]
    }

    #[test]
    fn empty_batch_is_an_error() {
        let detector = DbscanDetector::default();
        assert!(matches!(
            detector.detect(&[]),
            Err(RankError::EmptyBatch)
        ));
    }

    #[test]
    fn spiking_series_is_flagged_with_interval_count() {
        let detector = DbscanDetector::default();
        let batch = flat_batch_with_spike();
        let report = detector.detect(&batch).unwrap();

        assert_eq!(report.is_outlier, vec![false, false, false, false, true]);
        // Instants 2-3 and 5 deviate: two disjoint intervals.
        assert_eq!(report.interval_count[4], 2);
    }

    #[test]
    fn uniform_batch_has_no_outliers() {
        let detector = DbscanDetector::default();
        let batch = vec![
            series("a", &[1.0, 1.0, 1.0]),
            series("b", &[1.0, 1.0, 1.0]),
            series("c", &[1.0, 1.0, 1.0]),
        ];
        let report = detector.detect(&batch).unwrap();
        assert!(report.is_outlier.iter().all(|&o| !o));
        assert!(report.interval_count.iter().all(|&c| c == 0));
    }

    #[test]
    fn misaligned_series_are_dropped_not_flagged() {
        let detector = DbscanDetector::default();
        let mut batch = flat_batch_with_spike();
        // Shorter axis than the rest of the batch.
        batch.push(series("short", &[1.0, 1.0]));
        let report = detector.detect(&batch).unwrap();

        assert_eq!(report.is_outlier.len(), batch.len());
        assert!(!report.is_outlier[5]);
        assert_eq!(report.interval_count[5], 0);
        // The joined series still rank as before.
        assert!(report.is_outlier[4]);
    }

    #[test]
    fn all_null_series_are_dropped_not_flagged() {
        let detector = DbscanDetector::default();
        let mut batch = flat_batch_with_spike();
        batch.push(Series::new("nulls", vec![None; 6], (0..6).map(|i| i * 60).collect()).unwrap());
        let report = detector.detect(&batch).unwrap();
        assert!(!report.is_outlier[5]);
        assert!(report.is_outlier[4]);
    }

    #[test]
    fn single_series_batch_has_no_outliers() {
        let detector = DbscanDetector::default();
        let report = detector.detect(&[series("only", &[1.0, 99.0, 1.0])]).unwrap();
        assert_eq!(report.is_outlier, vec![false]);
    }

    #[test]
    fn count_runs_counts_disjoint_intervals() {
        assert_eq!(count_runs(&[]), 0);
        assert_eq!(count_runs(&[false, false]), 0);
        assert_eq!(count_runs(&[true, true, false, true]), 2);
        assert_eq!(count_runs(&[true]), 1);
        assert_eq!(count_runs(&[false, true, true, true, false, false, true]), 2);
    }
}
