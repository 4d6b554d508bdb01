//! Site energy statistics: bucketed meter and price series in, idempotently stored statistics out.
//!
//! Layers, leaves first:
//! - [`bucket`], [`tz`], [`solar`], [`calendar`]: the time axis, local months and nights
//! - [`series`], [`join`]: typed series and their alignment
//! - [`analysis`]: pricing, peaks, baseload, injection split
//! - [`store`], [`db`]: SQLite persistence of [`statistic::StatisticRow`]s
//! - [`config`], [`runner`]: one configured run over every meter of a site

pub mod analysis;
pub mod bucket;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod join;
pub(crate) mod models;
pub mod runner;
pub mod schema;
pub mod series;
pub mod solar;
pub mod statistic;
pub mod store;
pub mod tz;

pub use error::{StatsError, StatsResult};
