//! Error taxonomy of the statistics engine.

use series_source::SourceError;

/// Errors raised while aligning series, computing statistics, or persisting them.
#[derive(thiserror::Error, Debug)]
pub enum StatsError {
    /// Malformed or out-of-range time input. Fatal to the single computation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Empty or non-overlapping series. The affected metric is skipped.
    #[error("series mismatch: {0}")]
    SeriesMismatch(String),

    /// A series required by a metric is not known to the source.
    #[error("series not found: {0}")]
    MissingSeries(String),

    /// The series source failed; the series is treated as unavailable.
    #[error("series source error")]
    Source(#[from] SourceError),

    /// Store unavailable or constraint violated. The whole batch failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<diesel::result::Error> for StatsError {
    fn from(e: diesel::result::Error) -> Self {
        StatsError::Persistence(e.to_string())
    }
}

impl From<diesel::ConnectionError> for StatsError {
    fn from(e: diesel::ConnectionError) -> Self {
        StatsError::Persistence(e.to_string())
    }
}

/// Result alias used across the engine.
pub type StatsResult<T> = Result<T, StatsError>;
