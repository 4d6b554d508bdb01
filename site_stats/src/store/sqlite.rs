use chrono::{DateTime, Datelike, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel::{SqliteConnection, insert_into};
use series_source::SeriesMeta;
use tracing::debug;

use crate::db::connection::connect_sqlite;
use crate::error::{StatsError, StatsResult};
use crate::models::{SeriesRecord, StatisticRecord, StoredStatistic};
use crate::schema::{statistics, timeseries};
use crate::statistic::{StatKey, StatisticRow};
use crate::store::StatisticsStore;
use crate::tz;

/// Bounds past this year no longer format as four-digit RFC3339 and are treated as open.
const MAX_TEXT_YEAR: i32 = 9999;

/// SQLite-backed store. Each call opens its own connection, so one handle can be shared by
/// concurrent writers; SQLite serializes them through immediate transactions.
#[derive(Debug, Clone)]
pub struct SqliteStatisticsStore {
    database_url: String,
}

impl SqliteStatisticsStore {
    /// Handle on the database at `database_url` (path or `sqlite:` URL).
    ///
    /// The schema must already be migrated, see [`crate::db::migrate::run_all`].
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    fn connect(&self) -> StatsResult<SqliteConnection> {
        connect_sqlite(&self.database_url).map_err(|e| StatsError::Persistence(format!("{e:#}")))
    }
}

fn record(row: &StatisticRow) -> StatisticRecord<'_> {
    StatisticRecord {
        site_id: &row.site_id,
        series_id: row.series_id,
        stat_key: row.key.as_str(),
        value: row.value,
        description: &row.description,
        computed_at: tz::to_rfc3339_millis(row.computed_at),
        from_utc: tz::to_rfc3339_millis(row.window_start),
        to_utc: tz::to_rfc3339_millis(row.window_end),
        event_time_utc: row.event_time.map(tz::to_rfc3339_millis),
    }
}

fn parse_stored(s: &str) -> StatsResult<DateTime<Utc>> {
    tz::parse_ts_to_utc(s).map_err(|e| StatsError::Persistence(format!("corrupt timestamp in store: {e}")))
}

impl TryFrom<StoredStatistic> for StatisticRow {
    type Error = StatsError;

    fn try_from(s: StoredStatistic) -> StatsResult<Self> {
        Ok(StatisticRow {
            computed_at: parse_stored(&s.computed_at)?,
            window_start: parse_stored(&s.from_utc)?,
            window_end: parse_stored(&s.to_utc)?,
            event_time: s.event_time_utc.as_deref().map(parse_stored).transpose()?,
            site_id: s.site_id,
            series_id: s.series_id,
            key: StatKey::new(s.stat_key),
            value: s.value,
            description: s.description,
        })
    }
}

impl StatisticsStore for SqliteStatisticsStore {
    fn register_series(&self, series: &[SeriesMeta]) -> StatsResult<usize> {
        let mut conn = self.connect()?;
        conn.immediate_transaction::<_, StatsError, _>(|conn| {
            let mut n = 0;
            for meta in series {
                let row = SeriesRecord {
                    id: meta.id,
                    name: &meta.name,
                    category: &meta.category,
                };
                n += insert_into(timeseries::table)
                    .values(&row)
                    .on_conflict(timeseries::id)
                    .do_update()
                    .set((
                        &row,
                        timeseries::updated_at.eq(tz::to_rfc3339_millis(Utc::now())),
                    ))
                    .execute(conn)?;
            }
            Ok(n)
        })
    }

    fn upsert(&self, rows: &[StatisticRow]) -> StatsResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connect()?;
        let written = conn.immediate_transaction::<_, StatsError, _>(|conn| {
            let mut n = 0;
            for row in rows {
                let rec = record(row);
                // INSERT .. ON CONFLICT (natural key) DO UPDATE
                n += insert_into(statistics::table)
                    .values(&rec)
                    .on_conflict((statistics::series_id, statistics::stat_key, statistics::from_utc))
                    .do_update()
                    .set(&rec)
                    .execute(conn)?;
            }
            Ok(n)
        })?;
        debug!(rows = written, "statistics upserted");
        Ok(written)
    }

    fn find_between(
        &self,
        series_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StatsResult<Vec<StatisticRow>> {
        use crate::schema::statistics::dsl as st;

        let mut conn = self.connect()?;
        // fixed-width RFC3339 strings compare in time order (years 0000..=9999)
        let mut query = st::statistics
            .select(StoredStatistic::as_select())
            .filter(st::series_id.eq(series_id))
            .filter(st::from_utc.ge(tz::to_rfc3339_millis(from)))
            .into_boxed::<Sqlite>();
        if to.year() <= MAX_TEXT_YEAR {
            query = query.filter(st::to_utc.le(tz::to_rfc3339_millis(to)));
        }
        let stored: Vec<StoredStatistic> = query
            .order((st::from_utc.asc(), st::stat_key.asc()))
            .load(&mut conn)?;
        stored.into_iter().map(StatisticRow::try_from).collect()
    }
}
