//! Time zone parsing and conversion helpers.
//!
//! What this module provides:
//! - [`parse_ts_to_utc`]: Parse RFC-3339 timestamps with an explicit offset and convert to UTC.
//! - [`parse_tz`]: Resolve an IANA time zone name (e.g., "Europe/Brussels").
//! - [`localize`]: View a UTC instant in a site's local time zone.
//! - [`from_local_naive`]: Convert a naive local timestamp to UTC, resolving DST gaps
//!   (spring-forward) and ambiguities (fall-back).
//! - [`local_midnight_utc`]: UTC instant of local midnight on a date, used for month and day
//!   boundaries.
//!
//! Notes:
//! - All database writes are RFC-3339 UTC strings with millisecond precision
//!   ([`to_rfc3339_millis`]); all bucket math uses UTC. Local time only decides which calendar
//!   month or day a bucket belongs to.
//! - Europe/Brussels, 2025-03-30: 02:00 local jumps to 03:00, so that local day has 92 buckets;
//!   2025-10-26 repeats 02:xx and has 100.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{StatsError, StatsResult};

/// RFC-3339 with offset -> UTC.
///
/// Example:
/// - "2025-03-10T09:30:00+01:00" -> "2025-03-10T08:30:00Z"
pub fn parse_ts_to_utc(s: &str) -> StatsResult<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s.trim())
        .map_err(|e| StatsError::InvalidTimestamp(format!("bad rfc3339 {s:?}: {e}")))?;
    Ok(dt.with_timezone(&Utc))
}

/// Parse an IANA time zone name.
pub fn parse_tz(name: &str) -> StatsResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| StatsError::InvalidTimestamp(format!("unknown time zone: {name}")))
}

/// View a UTC instant in `tz`.
pub fn localize(ts_utc: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    ts_utc.with_timezone(&tz)
}

/// Inverse of [`localize`].
pub fn to_utc(local: DateTime<Tz>) -> DateTime<Utc> {
    local.with_timezone(&Utc)
}

/// Convert a naive local timestamp in `tz` to UTC.
///
/// Ambiguous (fall-back) times resolve to the earlier instant. Nonexistent (spring-forward)
/// times shift forward minute by minute to the first valid instant, at most 2 hours.
pub fn from_local_naive(naive: NaiveDateTime, tz: Tz) -> StatsResult<DateTime<Utc>> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) | Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        None => {
            let mut t = naive;
            for _ in 0..120 {
                t += chrono::Duration::minutes(1);
                match tz.from_local_datetime(&t) {
                    Single(dt) | Ambiguous(dt, _) => return Ok(dt.with_timezone(&Utc)),
                    None => continue,
                }
            }
            Err(StatsError::InvalidTimestamp(format!(
                "nonexistent local time {naive} in {tz}"
            )))
        }
    }
}

/// UTC instant of local midnight starting `date` in `tz`.
pub fn local_midnight_utc(date: NaiveDate, tz: Tz) -> StatsResult<DateTime<Utc>> {
    from_local_naive(date.and_time(chrono::NaiveTime::MIN), tz)
}

/// Format a UTC datetime as an RFC-3339 string with millisecond precision.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brussels() -> Tz {
        parse_tz("Europe/Brussels").unwrap()
    }

    #[test]
    fn parse_rfc3339_offset_to_utc() {
        let got = parse_ts_to_utc("2025-03-10T09:30:00+01:00").unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 3, 10, 8, 30, 0).unwrap());
        assert!(parse_ts_to_utc("2025-03-10 09:30").is_err());
    }

    #[test]
    fn unknown_zone_is_invalid() {
        assert!(matches!(parse_tz("Mars/Olympus"), Err(StatsError::InvalidTimestamp(_))));
    }

    #[test]
    fn localize_roundtrip() {
        let t = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap();
        let local = localize(t, brussels());
        assert_eq!(local.naive_local().to_string(), "2025-07-01 12:00:00");
        assert_eq!(to_utc(local), t);
    }

    #[test]
    fn brussels_spring_forward_gap() {
        let naive = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        // 03:00 CEST is 01:00Z
        let got = from_local_naive(naive, brussels()).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 3, 30, 1, 0, 0).unwrap());
    }

    #[test]
    fn brussels_fall_back_ambiguity() {
        let naive = NaiveDate::from_ymd_opt(2025, 10, 26)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        // 02:30 CEST, the first of the two
        let got = from_local_naive(naive, brussels()).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 10, 26, 0, 30, 0).unwrap());
    }

    #[test]
    fn midnight_in_winter_and_summer() {
        let jan = local_midnight_utc(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), brussels());
        assert_eq!(jan.unwrap(), Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap());
        let jul = local_midnight_utc(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), brussels());
        assert_eq!(jul.unwrap(), Utc.with_ymd_and_hms(2025, 6, 30, 22, 0, 0).unwrap());
    }

    #[test]
    fn millis_format_is_utc_z() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_rfc3339_millis(t), "2025-01-01T00:00:00.000Z");
    }
}
