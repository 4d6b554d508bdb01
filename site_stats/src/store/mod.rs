//! Statistics persistence.
//!
//! Rows are keyed by `(series_id, stat_key, window start)`. Writing a row with an existing key
//! replaces its value, description, computation time, window end and event time; other keys are
//! never touched and nothing is ever deleted. A batch is all-or-nothing.

mod sqlite;

use chrono::{DateTime, Utc};
use series_source::SeriesMeta;

use crate::error::StatsResult;
use crate::statistic::StatisticRow;

pub use sqlite::SqliteStatisticsStore;

/// Portable surface, SQLite implementation lives in `sqlite.rs`.
pub trait StatisticsStore: Send + Sync {
    /// Inserts or updates series metadata so statistics can reference it.
    fn register_series(&self, series: &[SeriesMeta]) -> StatsResult<usize>;

    /// Writes `rows` as one atomic batch and returns how many were written.
    ///
    /// Fails with [`StatsError::Persistence`](crate::error::StatsError::Persistence) if any row
    /// references an unregistered series or the store is unreachable; nothing is written then.
    fn upsert(&self, rows: &[StatisticRow]) -> StatsResult<usize>;

    /// Rows of `series_id` whose window lies inside `[from, to)`, by window start then key.
    ///
    /// `to = DateTime::<Utc>::MAX_UTC` leaves the range open at the end.
    fn find_between(
        &self,
        series_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StatsResult<Vec<StatisticRow>>;
}
