use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use metriscope_core::Series;

use crate::error::RankError;

/// Identifier of a per-series aggregate. All reducers skip null samples and
/// return a `0.0` sentinel on empty or all-null input — they never fail.
/// `First`/`Last` are the "first (last) non-null value" fallback reducers
/// for criteria where a real statistic is not applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReducerId {
    #[serde(rename = "stddev")]
    StdDev,
    #[serde(rename = "mean")]
    Mean,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "sum")]
    Sum,
    #[serde(rename = "first")]
    First,
    #[serde(rename = "last")]
    Last,
}

impl ReducerId {
    pub fn as_str(self) -> &'static str {
        match self {
            ReducerId::StdDev => "stddev",
            ReducerId::Mean => "mean",
            ReducerId::Min => "min",
            ReducerId::Max => "max",
            ReducerId::Sum => "sum",
            ReducerId::First => "first",
            ReducerId::Last => "last",
        }
    }
}

impl fmt::Display for ReducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReducerId {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stddev" => Ok(ReducerId::StdDev),
            "mean" => Ok(ReducerId::Mean),
            "min" => Ok(ReducerId::Min),
            "max" => Ok(ReducerId::Max),
            "sum" => Ok(ReducerId::Sum),
            "first" => Ok(ReducerId::First),
            "last" => Ok(ReducerId::Last),
            other => Err(RankError::UnknownReducer(other.to_string())),
        }
    }
}

/// Apply a reducer to one series.
pub fn reduce(id: ReducerId, series: &Series) -> f64 {
    match id {
        ReducerId::StdDev => stddev(series),
        ReducerId::Mean => mean(series).unwrap_or(0.0),
        ReducerId::Min => series.non_null_values().reduce(f64::min).unwrap_or(0.0),
        ReducerId::Max => series.non_null_values().reduce(f64::max).unwrap_or(0.0),
        ReducerId::Sum => series.non_null_values().sum(),
        ReducerId::First => series.non_null_values().next().unwrap_or(0.0),
        ReducerId::Last => series.non_null_values().last().unwrap_or(0.0),
    }
}

/// Apply a reducer across a whole batch, one value per series. Reduction is
/// independent per series, so it runs in parallel.
pub fn reduce_batch(id: ReducerId, batch: &[Series]) -> Vec<f64> {
    batch.par_iter().map(|series| reduce(id, series)).collect()
}

fn mean(series: &Series) -> Option<f64> {
    let mut count = 0usize;
    let mut sum = 0.0;
    for v in series.non_null_values() {
        count += 1;
        sum += v;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Population standard deviation over the non-null samples.
fn stddev(series: &Series) -> f64 {
    let Some(mean) = mean(series) else {
        return 0.0;
    };
    let mut count = 0usize;
    let mut sum_sq = 0.0;
    for v in series.non_null_values() {
        let d = v - mean;
        count += 1;
        sum_sq += d * d;
    }
    (sum_sq / count as f64).sqrt()
}
