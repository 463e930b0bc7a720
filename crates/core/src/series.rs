use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single labeled time series: a display label plus a value per timestamp.
///
/// Values are optional because a scrape may have gaps; the timestamp axis is
/// shared across a batch (same length for every series rendered together).
/// Ranking code reads series but never mutates them — every sort returns a
/// fresh permutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<Option<f64>>,
    pub timestamps: Vec<i64>,
}

impl Series {
    /// Build a series, rejecting mismatched value/timestamp lengths.
    pub fn new(
        label: impl Into<String>,
        values: Vec<Option<f64>>,
        timestamps: Vec<i64>,
    ) -> Result<Self, CoreError> {
        let label = label.into();
        if values.len() != timestamps.len() {
            return Err(CoreError::MismatchedLengths {
                label,
                values: values.len(),
                timestamps: timestamps.len(),
            });
        }
        Ok(Self {
            label,
            values,
            timestamps,
        })
    }

    /// Number of samples on the time axis.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// True when every sample is missing (or the series has no samples).
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(|v| v.is_none())
    }

    /// Iterate over the non-null values in timestamp order.
    pub fn non_null_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}
