mod common;
use common::{assert_sqlite_pragmas, setup_db};

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Integer;

#[derive(QueryableByName)]
struct TblCnt {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}

#[test]
fn migrations_apply_and_pragmas_are_set() {
    let (_db, mut conn) = setup_db();

    // PRAGMAs (WAL is a persistent property of the .db file; FKs/timeout are per-connection)
    assert_sqlite_pragmas(&mut conn);

    let tbls: TblCnt = sql_query(
        "SELECT COUNT(*) AS cnt
            FROM sqlite_master
            WHERE type='table'
            AND name IN ('statistics','timeseries');",
    )
    .get_result(&mut conn)
    .unwrap();
    assert_eq!(tbls.cnt, 2, "expected both tables to be present");
}

#[test]
fn natural_key_is_unique_at_the_schema_level() {
    let (_db, mut conn) = setup_db();
    sql_query("INSERT INTO timeseries (id, name, category) VALUES (1, 'EAN-1', 'digital_meter');")
        .execute(&mut conn)
        .unwrap();
    let insert = "INSERT INTO statistics
        (site_id, series_id, stat_key, value, description, computed_at, from_utc, to_utc)
        VALUES ('00000', 1, 'peak/offtake', 1.0, 'x', '2025-01-01T00:00:00.000Z',
                '2024-12-31T23:00:00.000Z', '2025-01-31T23:00:00.000Z');";
    sql_query(insert).execute(&mut conn).unwrap();
    assert!(sql_query(insert).execute(&mut conn).is_err());
}

#[test]
fn statistics_require_a_registered_series() {
    let (_db, mut conn) = setup_db();
    let res = sql_query(
        "INSERT INTO statistics
            (site_id, series_id, stat_key, value, description, computed_at, from_utc, to_utc)
            VALUES ('00000', 42, 'peak/offtake', 1.0, 'x', '2025-01-01T00:00:00.000Z',
                    '2024-12-31T23:00:00.000Z', '2025-01-31T23:00:00.000Z');",
    )
    .execute(&mut conn);
    assert!(res.is_err(), "foreign_keys=ON must reject unknown series");
}
