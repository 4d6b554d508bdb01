//! Series source abstraction.
//!
//! This module defines the [`SeriesSource`] trait, the single seam through which
//! the engine reads series metadata and raw readings. Implementations wrap a
//! concrete backend (warehouse export on disk, in-memory fixtures, ...).
//!
//! The trait is async and object safe, so callers can hold an
//! `Arc<dyn SeriesSource + Send + Sync>` selected at runtime.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chrono::{DateTime, Utc};
//! use series_source::{DataPoint, SeriesFilter, SeriesMeta, SeriesSource, SourceError};
//!
//! struct Empty;
//!
//! #[async_trait]
//! impl SeriesSource for Empty {
//!     async fn list_series(&self, _filter: &SeriesFilter) -> Result<Vec<SeriesMeta>, SourceError> {
//!         Ok(vec![])
//!     }
//!
//!     async fn get_datapoints(
//!         &self,
//!         id: i64,
//!         _from: DateTime<Utc>,
//!         _to: DateTime<Utc>,
//!     ) -> Result<Vec<DataPoint>, SourceError> {
//!         Err(SourceError::UnknownSeries(id))
//!     }
//! }
//! ```

pub mod json_dir;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    errors::SourceError,
    models::{data_point::DataPoint, filter::SeriesFilter, series_meta::SeriesMeta},
};

pub use json_dir::JsonDirSource;
pub use memory::MemorySource;

/// Read access to series metadata and readings.
#[async_trait]
pub trait SeriesSource {
    /// Lists the series matching `filter`, ordered by id.
    async fn list_series(&self, filter: &SeriesFilter) -> Result<Vec<SeriesMeta>, SourceError>;

    /// Fetches the readings of series `id` with `from <= start < to`.
    ///
    /// Implementations must return points sorted ascending by `start`, without duplicates.
    async fn get_datapoints(
        &self,
        id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, SourceError>;
}

/// Shared post-processing for in-process sources: window, sort, de-duplicate.
///
/// When a start occurs more than once the last point wins.
pub(crate) fn window_points(
    points: impl IntoIterator<Item = DataPoint>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<DataPoint> {
    let mut out: Vec<DataPoint> = points
        .into_iter()
        .filter(|p| p.start >= from && p.start < to)
        .collect();
    // stable sort keeps input order among equal starts, so dedup keeps the last one
    out.sort_by_key(|p| p.start);
    out.reverse();
    out.dedup_by_key(|p| p.start);
    out.reverse();
    out
}
