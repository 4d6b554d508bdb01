#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use series_source::SeriesMeta;
use site_stats::db::{connection, migrate};
use site_stats::statistic::{RunStamp, StatKey, StatisticRow};
use site_stats::store::SqliteStatisticsStore;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

impl TestDb {
    pub fn store(&self) -> SqliteStatisticsStore {
        SqliteStatisticsStore::new(self.path.clone())
    }
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn meter_meta(id: i64) -> SeriesMeta {
    SeriesMeta {
        id,
        name: format!("EAN-{id}"),
        category: "digital_meter".into(),
        field_names: vec!["offtake".into(), "injection".into()],
        period: Some("PT15M".into()),
    }
}

/// 2025-01-01T00:00 Europe/Brussels.
pub fn jan_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap()
}

/// 2025-02-01T00:00 Europe/Brussels.
pub fn feb_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 31, 23, 0, 0).unwrap()
}

pub fn row(series_id: i64, key: StatKey, value: f64, window: (DateTime<Utc>, DateTime<Utc>)) -> StatisticRow {
    let computed = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
    RunStamp::new("00000", computed).row(series_id, key, value, "test row", window)
}
