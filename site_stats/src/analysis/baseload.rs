//! Monthly minimal ("always-on") offtake.
//!
//! On a meter that injects, daytime offtake is masked by local production, so only night buckets
//! are considered. A meter that never injects is evaluated over every bucket.

use chrono_tz::Tz;
use tracing::debug;

use crate::analysis::{slice_in, to_power};
use crate::calendar::{CalendarWindow, is_night};
use crate::series::{MeterPoint, MeterSeries};
use crate::solar::Observer;
use crate::statistic::{RunStamp, StatKey, StatisticRow};

pub const BASELOAD_DESCRIPTION: &str = "Minimal Offtake (kW)";

/// Smallest offtake among `points`, optionally restricted to night buckets.
pub fn minimum<'a>(
    points: impl IntoIterator<Item = &'a MeterPoint>,
    night: Option<(&Observer, Tz)>,
) -> Option<f64> {
    points
        .into_iter()
        .filter(|p| night.is_none_or(|(obs, tz)| is_night(p.bucket.start_utc(), obs, tz)))
        .map(|p| p.offtake)
        .reduce(f64::min)
}

/// One `minimal/offtake` row per month window with at least one eligible bucket.
pub fn baseload_rows(
    stamp: &RunStamp,
    meter: &MeterSeries,
    months: &[CalendarWindow],
    observer: &Observer,
    tz: Tz,
) -> Vec<StatisticRow> {
    let night = meter.has_injection().then_some((observer, tz));
    debug!(series_id = meter.id, night_filter = night.is_some(), "baseload");
    months
        .iter()
        .filter_map(|month| {
            let min = minimum(slice_in(&meter.points, month), night)?;
            Some(stamp.row(
                meter.id,
                StatKey::minimal_offtake(),
                to_power(min),
                BASELOAD_DESCRIPTION,
                (month.start, month.end),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures;
    use crate::calendar::month_windows;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn brussels() -> Tz {
        crate::tz::parse_tz("Europe/Brussels").unwrap()
    }

    /// One day of readings from local midnight, 0.5 everywhere except a 0.1 dip at local noon.
    fn day_with_noon_dip(injection_at_noon: f64) -> (DateTime<Utc>, Vec<(f64, f64)>) {
        let start = Utc.with_ymd_and_hms(2025, 6, 14, 22, 0, 0).unwrap();
        let noon = 12 * 4;
        let values = (0..96)
            .map(|i| if i == noon { (0.1, injection_at_noon) } else { (0.5, 0.0) })
            .collect();
        (start, values)
    }

    #[test]
    fn zero_injection_ignores_night_filter() {
        let tz = brussels();
        let (start, values) = day_with_noon_dip(0.0);
        let m = fixtures::meter(start, &values);
        let months = month_windows(start, start + Duration::days(1), tz).unwrap();

        let unfiltered = minimum(&m.points, None);
        let rows = baseload_rows(&RunStamp::new("00000", start), &m, &months, &Observer::BRUSSELS, tz);
        assert_eq!(rows.len(), 1);
        assert_eq!(Some(rows[0].value / 4.0), unfiltered);
        assert_eq!(rows[0].value, 0.4);
        assert_eq!(rows[0].event_time, None);
    }

    #[test]
    fn injecting_meter_only_counts_night_buckets() {
        let tz = brussels();
        let (start, values) = day_with_noon_dip(2.0);
        let m = fixtures::meter(start, &values);
        let months = month_windows(start, start + Duration::days(1), tz).unwrap();

        let rows = baseload_rows(&RunStamp::new("00000", start), &m, &months, &Observer::BRUSSELS, tz);
        assert_eq!(rows[0].value, 2.0);
        assert_eq!(rows[0].description, BASELOAD_DESCRIPTION);
        assert_eq!(minimum(&m.points, None), Some(0.1));
    }

    #[test]
    fn month_without_night_buckets_has_no_row() {
        let tz = brussels();
        // two daylight buckets around local noon, with injection
        let start = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap();
        let m = fixtures::meter(start, &[(0.3, 1.0), (0.2, 1.0)]);
        let months = month_windows(start, start + Duration::minutes(30), tz).unwrap();
        let rows = baseload_rows(&RunStamp::new("00000", start), &m, &months, &Observer::BRUSSELS, tz);
        assert!(rows.is_empty());
    }
}
