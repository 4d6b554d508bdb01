//! Monthly peak offtake.

use crate::analysis::{slice_in, to_power};
use crate::calendar::CalendarWindow;
use crate::series::{MeterPoint, MeterSeries};
use crate::statistic::{RunStamp, StatKey, StatisticRow};

pub const PEAK_DESCRIPTION: &str = "Peak Offtake (kW)";

/// Point with the highest offtake; the earliest one wins ties.
pub fn peak(points: &[MeterPoint]) -> Option<&MeterPoint> {
    points.iter().fold(None, |best: Option<&MeterPoint>, p| match best {
        Some(b) if b.offtake >= p.offtake => Some(b),
        _ => Some(p),
    })
}

/// One `peak/offtake` row per month window that holds readings.
///
/// The value is the peak bucket's energy times 4 (average kW over the quarter hour); the event
/// time is the start of that bucket.
pub fn peak_rows(stamp: &RunStamp, meter: &MeterSeries, months: &[CalendarWindow]) -> Vec<StatisticRow> {
    months
        .iter()
        .filter_map(|month| {
            let p = peak(slice_in(&meter.points, month))?;
            let mut row = stamp.row(
                meter.id,
                StatKey::peak_offtake(),
                to_power(p.offtake),
                PEAK_DESCRIPTION,
                (month.start, month.end),
            );
            row.event_time = Some(p.bucket.start_utc());
            Some(row)
        })
        .collect()
}
