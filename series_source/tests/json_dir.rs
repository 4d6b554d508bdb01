use chrono::{Duration, TimeZone, Utc};
use series_source::{JsonDirSource, SeriesFilter, SeriesSource, SourceError};
use tempfile::TempDir;

fn write_export(dir: &TempDir) {
    std::fs::write(
        dir.path().join("timeseries.json"),
        r#"[
            {"id": 20, "name": "Epex/BE/15", "vaultName": "prices", "fieldNames": ["price"], "period": "PT15M"},
            {"id": 3, "name": "EAN-541", "vaultName": "digital_meter", "fieldNames": ["offtake", "injection"]},
            {"id": 4, "name": "EAN-542", "vaultName": "digital_meter", "fieldNames": ["offtake", "injection"]}
        ]"#,
    )
    .unwrap();
    std::fs::create_dir(dir.path().join("values")).unwrap();
    std::fs::write(
        dir.path().join("values").join("3.json"),
        r#"[
            {"start": "2025-01-01T00:30:00Z", "values": [0.3, 0.0]},
            {"start": "2025-01-01T00:00:00Z", "values": [0.1, null]},
            {"start": "2025-01-01T01:15:00+01:00", "values": [0.2, 0.0]}
        ]"#,
    )
    .unwrap();
}

#[tokio::test]
async fn lists_series_by_category_in_id_order() {
    let dir = TempDir::new().unwrap();
    write_export(&dir);
    let source = JsonDirSource::new(dir.path());

    let meters = source
        .list_series(&SeriesFilter::category("digital_meter"))
        .await
        .unwrap();
    let ids: Vec<i64> = meters.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 4]);

    let epex = source.list_series(&SeriesFilter::name("Epex/BE/15")).await.unwrap();
    assert_eq!(epex.len(), 1);
    assert_eq!(epex[0].field_names, vec!["price".to_string()]);
}

#[tokio::test]
async fn datapoints_are_sorted_and_windowed() {
    let dir = TempDir::new().unwrap();
    write_export(&dir);
    let source = JsonDirSource::new(dir.path());

    let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let points = source
        .get_datapoints(3, from, from + Duration::minutes(30))
        .await
        .unwrap();

    // 01:15+01:00 is 00:15Z; 00:30Z falls on the exclusive end
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].start, from);
    assert_eq!(points[0].value(1), None);
    assert_eq!(points[1].start, from + Duration::minutes(15));
    assert_eq!(points[1].value(0), Some(0.2));
}

#[tokio::test]
async fn missing_values_file_is_an_empty_series() {
    let dir = TempDir::new().unwrap();
    write_export(&dir);
    let source = JsonDirSource::new(dir.path());

    let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let points = source.get_datapoints(4, from, from + Duration::days(1)).await.unwrap();
    assert!(points.is_empty());
}

#[tokio::test]
async fn unknown_series_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_export(&dir);
    let source = JsonDirSource::new(dir.path());

    let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let err = source
        .get_datapoints(99, from, from + Duration::days(1))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::UnknownSeries(99)));
}

#[tokio::test]
async fn unreadable_values_location_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("timeseries.json"),
        r#"[{"id": 1, "name": "EAN-540", "vaultName": "digital_meter", "fieldNames": ["offtake"]}]"#,
    )
    .unwrap();
    // a plain file where the values directory should be
    std::fs::write(dir.path().join("values"), "not a directory").unwrap();
    let source = JsonDirSource::new(dir.path());

    let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let err = source
        .get_datapoints(1, from, from + Duration::days(1))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Io { .. }), "got {err:?}");
}
