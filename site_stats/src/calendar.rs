//! Calendar windows over an analysis interval.
//!
//! - Month windows are full local calendar months, `[local 00:00 on the 1st, local 00:00 on the
//!   1st of the next month)`, emitted for every month that intersects `[from, to)`. A month therefore
//!   holds 2972 buckets in a spring-forward month and 2980 in a fall-back month (Europe/Brussels).
//! - Night windows are the complement of daylight inside `[from, to)`: `[sunset, next sunrise)`,
//!   clipped to the interval.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::{StatsError, StatsResult};
use crate::solar::{Daylight, Observer, daylight};
use crate::tz::{local_midnight_utc, localize};

/// What a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// One local calendar month.
    Month { year: i32, month: u32 },
    /// Sunset to the following sunrise.
    Night,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            Period::Night => f.write_str("night"),
        }
    }
}

/// Half-open interval `[start, end)` in UTC, tagged with its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period: Period,
}

/// Local calendar month containing `ts`.
pub fn month_of(ts: DateTime<Utc>, tz: Tz) -> (i32, u32) {
    let local = localize(ts, tz);
    (local.year(), local.month())
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn first_of_month(year: i32, month: u32) -> StatsResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| StatsError::InvalidTimestamp(format!("invalid month {year}-{month:02}")))
}

/// The window of one local calendar month.
pub fn month_window(year: i32, month: u32, tz: Tz) -> StatsResult<CalendarWindow> {
    let (ny, nm) = next_month(year, month);
    Ok(CalendarWindow {
        start: local_midnight_utc(first_of_month(year, month)?, tz)?,
        end: local_midnight_utc(first_of_month(ny, nm)?, tz)?,
        period: Period::Month { year, month },
    })
}

/// One window per local calendar month intersecting `[from, to)`, in order.
///
/// Windows are whole months and are not clipped to the interval.
pub fn month_windows(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    tz: Tz,
) -> StatsResult<Vec<CalendarWindow>> {
    if to < from {
        return Err(StatsError::InvalidTimestamp(format!(
            "window end {to} precedes start {from}"
        )));
    }
    let mut out = Vec::new();
    if to == from {
        return Ok(out);
    }
    let (mut year, mut month) = month_of(from, tz);
    loop {
        let window = month_window(year, month, tz)?;
        if window.start >= to {
            break;
        }
        out.push(window);
        (year, month) = next_month(year, month);
    }
    Ok(out)
}

/// Daylight span on a local date, as UTC instants.
fn day_span(
    date: NaiveDate,
    observer: &Observer,
    tz: Tz,
) -> StatsResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    match daylight(date, observer) {
        Daylight::Interval { sunrise, sunset } => Ok(Some((sunrise, sunset))),
        Daylight::PolarNight => Ok(None),
        Daylight::MidnightSun => {
            let start = local_midnight_utc(date, tz)?;
            let end = local_midnight_utc(date + Duration::days(1), tz)?;
            Ok(Some((start, end)))
        }
    }
}

/// Ordered night windows inside `[from, to)`.
pub fn night_windows(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    observer: &Observer,
    tz: Tz,
) -> StatsResult<Vec<CalendarWindow>> {
    if to < from {
        return Err(StatsError::InvalidTimestamp(format!(
            "window end {to} precedes start {from}"
        )));
    }
    let first = localize(from, tz).date_naive() - Duration::days(1);
    let last = localize(to, tz).date_naive();

    let mut out = Vec::new();
    let mut cursor = from;
    for date in first.iter_days().take_while(|d| *d <= last) {
        let Some((sunrise, sunset)) = day_span(date, observer, tz)? else {
            continue;
        };
        if sunset <= cursor {
            continue;
        }
        if sunrise >= to {
            break;
        }
        push_night(&mut out, cursor, sunrise.min(to));
        cursor = cursor.max(sunset);
    }
    push_night(&mut out, cursor, to);
    Ok(out)
}

fn push_night(out: &mut Vec<CalendarWindow>, start: DateTime<Utc>, end: DateTime<Utc>) {
    if start < end {
        out.push(CalendarWindow {
            start,
            end,
            period: Period::Night,
        });
    }
}

/// True when `ts` falls before sunrise or at/after sunset of its local day.
///
/// The comparison is inclusive at sunset: the sunset instant itself is night, matching the
/// half-open `[sunset, next sunrise)` windows of [`night_windows`]. Polar night counts as night
/// all day, midnight sun as day all day.
pub fn is_night(ts: DateTime<Utc>, observer: &Observer, tz: Tz) -> bool {
    let date = localize(ts, tz).date_naive();
    match daylight(date, observer) {
        Daylight::Interval { sunrise, sunset } => ts < sunrise || ts >= sunset,
        Daylight::PolarNight => true,
        Daylight::MidnightSun => false,
    }
}
