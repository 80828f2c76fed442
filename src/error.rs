use thiserror::Error;

use crate::tracker::TrackerAlgorithm;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown tracker algorithm `{0}`")]
    UnknownTrackerAlgorithm(String),

    #[error("no tracker backend registered for algorithm `{0}`")]
    UnsupportedTracker(TrackerAlgorithm),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
