use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("outlier detection is not available on this host")]
    DetectorUnavailable,

    #[error("series batch is empty")]
    EmptyBatch,

    #[error("outlier detection failed: {0}")]
    Detector(String),

    #[error("unknown reducer id: {0}")]
    UnknownReducer(String),

    #[error("unknown sort criterion: {0}")]
    UnknownCriterion(String),
}
