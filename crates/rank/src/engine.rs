use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use lru::LruCache;
use tracing::{debug, warn};

use metriscope_core::{RankConfig, Series};

use crate::error::RankError;
use crate::outlier::{DbscanDetector, OutlierDetector, OutlierReport};
use crate::reducers::{self, ReducerId};

/// How a batch should be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortCriterion {
    Alphabetical,
    AlphabeticalReversed,
    Outliers,
    Reducer(ReducerId),
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortCriterion::Alphabetical => f.write_str("alphabetical"),
            SortCriterion::AlphabeticalReversed => f.write_str("alphabetical-reversed"),
            SortCriterion::Outliers => f.write_str("outliers"),
            SortCriterion::Reducer(id) => f.write_str(id.as_str()),
        }
    }
}

impl FromStr for SortCriterion {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alphabetical" => Ok(SortCriterion::Alphabetical),
            "alphabetical-reversed" => Ok(SortCriterion::AlphabeticalReversed),
            "outliers" => Ok(SortCriterion::Outliers),
            other => other
                .parse::<ReducerId>()
                .map(SortCriterion::Reducer)
                .map_err(|_| RankError::UnknownCriterion(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(RankError::UnknownCriterion(other.to_string())),
        }
    }
}

/// Sorts series batches, caching results under a structural fingerprint.
///
/// The cache is a bounded LRU (capacity from [`RankConfig`]) rather than an
/// unbounded map, so a long-lived process cannot accumulate every batch it
/// has ever ranked. A `None` detector models a host without the numeric
/// clustering capability; outlier requests then rank by dispersion.
pub struct SortEngine {
    cache: LruCache<String, Vec<Series>>,
    detector: Option<Box<dyn OutlierDetector>>,
}

impl SortEngine {
    pub fn new(config: &RankConfig) -> Self {
        let detector: Option<Box<dyn OutlierDetector>> = config
            .outlier_detection_enabled
            .then(|| {
                Box::new(DbscanDetector::new(config.outlier_sensitivity))
                    as Box<dyn OutlierDetector>
            });
        Self::build(config, detector)
    }

    /// Use a caller-supplied detector instead of the built-in DBSCAN one.
    pub fn with_detector(config: &RankConfig, detector: Box<dyn OutlierDetector>) -> Self {
        Self::build(config, Some(detector))
    }

    fn build(config: &RankConfig, detector: Option<Box<dyn OutlierDetector>>) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            detector,
        }
    }

    /// Order a batch for display. Always returns a full permutation of the
    /// input — detector failures are logged and downgraded to dispersion
    /// ranking, never surfaced.
    ///
    /// A repeated call with an unchanged batch and criterion is served from
    /// the cache without re-running any statistics.
    pub fn sort(
        &mut self,
        batch: &[Series],
        criterion: SortCriterion,
        direction: SortDirection,
    ) -> Vec<Series> {
        if batch.is_empty() {
            return Vec::new();
        }

        let key = fingerprint(batch, criterion, direction);
        if let Some(hit) = self.cache.get(&key) {
            debug!(criterion = %criterion, "sort served from cache");
            return hit.clone();
        }

        let sorted = match criterion {
            SortCriterion::Alphabetical => sort_alphabetical(batch, direction, false),
            SortCriterion::AlphabeticalReversed => sort_alphabetical(batch, direction, true),
            SortCriterion::Outliers => self.sort_outliers(batch, direction),
            SortCriterion::Reducer(id) => sort_by_reducer(batch, id, direction),
        };

        self.cache.put(key, sorted.clone());
        sorted
    }

    fn sort_outliers(&self, batch: &[Series], direction: SortDirection) -> Vec<Series> {
        let report = match &self.detector {
            Some(detector) => detector.detect(batch),
            None => Err(RankError::DetectorUnavailable),
        };
        match report {
            Ok(report) => sort_by_scores(batch, outlier_scores(&report), direction),
            Err(error) => {
                warn!(%error, "outlier ranking unavailable, falling back to stddev");
                sort_by_reducer(batch, ReducerId::StdDev, direction)
            }
        }
    }
}

/// Cheap structural digest of a batch: first/last labels, axis endpoints,
/// series count, criterion, direction. Samples only the edges of the
/// batch, so two batches differing in a middle series alone collide.
/// Fingerprinting must stay much cheaper than the statistics it guards.
fn fingerprint(batch: &[Series], criterion: SortCriterion, direction: SortDirection) -> String {
    let first = &batch[0];
    let last = &batch[batch.len() - 1];
    let first_ts = first.timestamps.first().copied().unwrap_or(0);
    let last_ts = last.timestamps.last().copied().unwrap_or(0);
    format!(
        "{}|{}|{}|{}|{}|{}|{}",
        first.label,
        last.label,
        first_ts,
        last_ts,
        batch.len(),
        criterion,
        direction
    )
}

/// Case-insensitive label comparison; series with an empty label compare
/// equal to everything, so they keep their relative position under stable
/// sorting.
fn cmp_labels(a: &str, b: &str) -> Ordering {
    if a.is_empty() || b.is_empty() {
        return Ordering::Equal;
    }
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn sort_alphabetical(batch: &[Series], direction: SortDirection, reversed: bool) -> Vec<Series> {
    // The reversed criterion and the descending direction each flip the
    // order; both together cancel out.
    let flip = reversed ^ (direction == SortDirection::Desc);
    let mut out = batch.to_vec();
    out.sort_by(|a, b| {
        let ord = cmp_labels(&a.label, &b.label);
        if flip {
            ord.reverse()
        } else {
            ord
        }
    });
    out
}

fn sort_by_reducer(batch: &[Series], id: ReducerId, direction: SortDirection) -> Vec<Series> {
    sort_by_scores(batch, reducers::reduce_batch(id, batch), direction)
}

/// Outliers rank by interval count (more disjoint anomalous intervals is a
/// stronger signal); non-outliers are a flat zero tie.
fn outlier_scores(report: &OutlierReport) -> Vec<f64> {
    report
        .is_outlier
        .iter()
        .zip(report.interval_count.iter())
        .map(|(&flagged, &intervals)| if flagged { intervals as f64 } else { 0.0 })
        .collect()
}

/// Stable index sort over per-series scores: descending for `Desc`,
/// ascending for `Asc`.
fn sort_by_scores(batch: &[Series], scores: Vec<f64>, direction: SortDirection) -> Vec<Series> {
    let mut indices: Vec<usize> = (0..batch.len()).collect();
    indices.sort_by(|&i, &j| match direction {
        SortDirection::Desc => scores[j].total_cmp(&scores[i]),
        SortDirection::Asc => scores[i].total_cmp(&scores[j]),
    });
    indices.into_iter().map(|i| batch[i].clone()).collect()
}
