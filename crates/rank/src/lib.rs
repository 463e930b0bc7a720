//! Series ranking engine.
//!
//! Orders a batch of already-fetched, time-aligned series for display:
//! alphabetically, by a statistics reducer, or by DBSCAN outlier detection.
//! Results are cached under a cheap structural fingerprint so repeated
//! renders of the same batch skip the expensive statistics entirely, and a
//! ranking request always produces a full permutation of its input — a
//! failed or unavailable detector downgrades to dispersion ranking instead
//! of surfacing an error.

pub mod engine;
pub mod error;
pub mod outlier;
pub mod reducers;

pub use engine::{SortCriterion, SortDirection, SortEngine};
pub use error::RankError;
pub use outlier::{DbscanDetector, OutlierDetector, OutlierReport};
pub use reducers::{reduce, reduce_batch, ReducerId};
