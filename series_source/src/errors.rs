use thiserror::Error;

/// Errors that can occur within a [`SeriesSource`](crate::providers::SeriesSource) implementation.
///
/// The engine treats all of them as "series unavailable".
#[derive(Debug, Error)]
pub enum SourceError {
    /// No series with this id is known to the source.
    #[error("unknown series id {0}")]
    UnknownSeries(i64),

    /// Reading the backing storage failed.
    #[error("I/O error reading {path}")]
    Io {
        /// File or resource being read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The payload could not be decoded.
    #[error("malformed payload in {path}")]
    Decode {
        /// File or resource being decoded.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The request parameters were invalid for this source.
    #[error("invalid request: {0}")]
    Validation(String),
}
