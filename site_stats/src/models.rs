//! Insertable/Queryable helper structs used by the statistics store.

use diesel::prelude::*;

use crate::schema::{statistics, timeseries};

/// Insert and conflict-update payload of one statistic; timestamps are RFC3339 UTC millis.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = statistics, treat_none_as_null = true)]
pub(crate) struct StatisticRecord<'a> {
    pub(crate) site_id: &'a str,
    pub(crate) series_id: i64,
    pub(crate) stat_key: &'a str,
    pub(crate) value: f64,
    pub(crate) description: &'a str,
    pub(crate) computed_at: String,
    pub(crate) from_utc: String,
    pub(crate) to_utc: String,
    pub(crate) event_time_utc: Option<String>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = statistics)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct StoredStatistic {
    pub(crate) site_id: String,
    pub(crate) series_id: i64,
    pub(crate) stat_key: String,
    pub(crate) value: f64,
    pub(crate) description: String,
    pub(crate) computed_at: String,
    pub(crate) from_utc: String,
    pub(crate) to_utc: String,
    pub(crate) event_time_utc: Option<String>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = timeseries)]
pub(crate) struct SeriesRecord<'a> {
    pub(crate) id: i64,
    pub(crate) name: &'a str,
    pub(crate) category: &'a str,
}
