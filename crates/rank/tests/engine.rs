//! Cross-module scenarios for the sort engine: caching behavior, direction
//! round-trips, and the detector fallback path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use metriscope_core::{RankConfig, Series};
use metriscope_rank::{
    DbscanDetector, OutlierDetector, OutlierReport, RankError, ReducerId, SortCriterion,
    SortDirection, SortEngine,
};

fn series(label: &str, values: &[f64]) -> Series {
    let timestamps: Vec<i64> = (0..values.len() as i64).map(|i| i * 60).collect();
    Series::new(label, values.iter().map(|&v| Some(v)).collect(), timestamps).unwrap()
}

fn labels(batch: &[Series]) -> Vec<&str> {
    batch.iter().map(|s| s.label.as_str()).collect()
}

fn batch_with_spike() -> Vec<Series> {
    vec![
        series("steady_a", &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
        series("steady_b", &[1.1, 1.0, 1.1, 1.0, 1.1, 1.0]),
        series("steady_c", &[0.9, 1.0, 0.9, 1.0, 0.9, 1.0]),
        series("steady_d", &[1.0, 1.1, 1.0, 0.9, 1.0, 1.1]),
        series("spiky", &[1.0, 1.0, 80.0, 80.0, 1.0, 90.0]),
    ]
}

/// Delegates to DBSCAN while counting invocations, so tests can prove the
/// cache short-circuits recomputation.
struct CountingDetector {
    inner: DbscanDetector,
    calls: Arc<AtomicUsize>,
}

impl OutlierDetector for CountingDetector {
    fn detect(&self, batch: &[Series]) -> Result<OutlierReport, RankError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.detect(batch)
    }
}

/// Models a runtime failure inside the clustering routine.
struct FailingDetector;

impl OutlierDetector for FailingDetector {
    fn detect(&self, _batch: &[Series]) -> Result<OutlierReport, RankError> {
        Err(RankError::Detector("simulated runtime failure".to_string()))
    }
}

#[test]
fn repeated_sort_is_idempotent_and_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let detector = CountingDetector {
        inner: DbscanDetector::default(),
        calls: Arc::clone(&calls),
    };
    let mut engine = SortEngine::with_detector(&RankConfig::default(), Box::new(detector));

    let batch = batch_with_spike();
    let first = engine.sort(&batch, SortCriterion::Outliers, SortDirection::Desc);
    let second = engine.sort(&batch, SortCriterion::Outliers, SortDirection::Desc);

    assert_eq!(first, second);
    // The second call must be a cache hit, not a re-detection.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn outliers_rank_before_steady_series() {
    let mut engine = SortEngine::new(&RankConfig::default());
    let sorted = engine.sort(
        &batch_with_spike(),
        SortCriterion::Outliers,
        SortDirection::Desc,
    );
    assert_eq!(sorted[0].label, "spiky");
    assert_eq!(sorted.len(), 5);
}

#[test]
fn alphabetical_direction_round_trip() {
    let mut engine = SortEngine::new(&RankConfig::default());
    let batch = vec![
        series("delta", &[1.0]),
        series("alpha", &[1.0]),
        series("charlie", &[1.0]),
        series("bravo", &[1.0]),
    ];

    let asc = engine.sort(&batch, SortCriterion::Alphabetical, SortDirection::Asc);
    let desc = engine.sort(&asc, SortCriterion::Alphabetical, SortDirection::Desc);

    let mut reversed = asc.clone();
    reversed.reverse();
    assert_eq!(desc, reversed);
}

#[test]
fn failing_detector_falls_back_to_stddev() {
    let batch = batch_with_spike();

    let mut failing = SortEngine::with_detector(&RankConfig::default(), Box::new(FailingDetector));
    let via_outliers = failing.sort(&batch, SortCriterion::Outliers, SortDirection::Desc);

    let mut plain = SortEngine::new(&RankConfig::default());
    let via_stddev = plain.sort(
        &batch,
        SortCriterion::Reducer(ReducerId::StdDev),
        SortDirection::Desc,
    );

    assert_eq!(labels(&via_outliers), labels(&via_stddev));
}

#[test]
fn disabled_detection_falls_back_to_stddev() {
    let batch = batch_with_spike();
    let config = RankConfig {
        outlier_detection_enabled: false,
        ..RankConfig::default()
    };

    let mut engine = SortEngine::new(&config);
    let via_outliers = engine.sort(&batch, SortCriterion::Outliers, SortDirection::Desc);

    let mut plain = SortEngine::new(&RankConfig::default());
    let via_stddev = plain.sort(
        &batch,
        SortCriterion::Reducer(ReducerId::StdDev),
        SortDirection::Desc,
    );

    assert_eq!(labels(&via_outliers), labels(&via_stddev));
}

// The fingerprint samples only the batch edges (first/last label, axis
// endpoints, count). A change confined to a middle series therefore hits
// the stale cache entry. The test pins that approximation down so any
// future fix is a deliberate one.
#[test]
fn cache_key_samples_only_batch_edges() {
    let mut engine = SortEngine::new(&RankConfig::default());

    let batch = vec![
        series("edge_first", &[1.0, 1.0, 1.0]),
        series("middle", &[1.0, 2.0, 3.0]),
        series("edge_last", &[9.0, 9.0, 9.0]),
    ];
    let first = engine.sort(
        &batch,
        SortCriterion::Reducer(ReducerId::Max),
        SortDirection::Desc,
    );

    let mut changed = batch.clone();
    changed[1] = series("middle", &[100.0, 100.0, 100.0]);
    let second = engine.sort(
        &changed,
        SortCriterion::Reducer(ReducerId::Max),
        SortDirection::Desc,
    );

    // Served from cache: the new middle values are not reflected.
    assert_eq!(labels(&first), labels(&second));
    assert_eq!(second[0].label, "edge_last");
}

#[test]
fn distinct_criteria_do_not_share_cache_entries() {
    let mut engine = SortEngine::new(&RankConfig::default());
    let batch = vec![
        series("b_small", &[1.0, 1.0]),
        series("a_large", &[100.0, 100.0]),
    ];

    let alpha = engine.sort(&batch, SortCriterion::Alphabetical, SortDirection::Asc);
    let by_max = engine.sort(
        &batch,
        SortCriterion::Reducer(ReducerId::Max),
        SortDirection::Desc,
    );

    assert_eq!(labels(&alpha), vec!["a_large", "b_small"]);
    assert_eq!(labels(&by_max), vec!["a_large", "b_small"]);
    // Same result here, but via different cache entries: flipping the
    // direction of the reducer sort must not be served from the
    // alphabetical entry either.
    let by_max_asc = engine.sort(
        &batch,
        SortCriterion::Reducer(ReducerId::Max),
        SortDirection::Asc,
    );
    assert_eq!(labels(&by_max_asc), vec!["b_small", "a_large"]);
}

#[test]
fn tiny_cache_capacity_still_sorts_correctly() {
    let config = RankConfig {
        cache_capacity: 1,
        ..RankConfig::default()
    };
    let mut engine = SortEngine::new(&config);
    let batch = vec![series("b", &[1.0]), series("a", &[2.0])];

    let asc = engine.sort(&batch, SortCriterion::Alphabetical, SortDirection::Asc);
    let by_max = engine.sort(
        &batch,
        SortCriterion::Reducer(ReducerId::Max),
        SortDirection::Desc,
    );
    // The alphabetical entry has been evicted; a fresh sort still works.
    let asc_again = engine.sort(&batch, SortCriterion::Alphabetical, SortDirection::Asc);

    assert_eq!(labels(&asc), vec!["a", "b"]);
    assert_eq!(labels(&by_max), vec!["a", "b"]);
    assert_eq!(asc, asc_again);
}
