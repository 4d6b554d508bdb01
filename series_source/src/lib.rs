//! Series source contract for the site statistics engine.
//!
//! The engine never talks to the data warehouse directly. It consumes series
//! metadata and raw datapoints through the [`providers::SeriesSource`] trait;
//! this crate holds that trait, the vendor-agnostic models it returns, and two
//! implementations: a JSON directory export and an in-memory source.

pub mod errors;
pub mod models;
pub mod providers;

pub use errors::SourceError;
pub use models::{data_point::DataPoint, filter::SeriesFilter, series_meta::SeriesMeta};
pub use providers::{JsonDirSource, MemorySource, SeriesSource};
