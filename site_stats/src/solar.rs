//! Sunrise/sunset for a fixed observer.
//!
//! Solar geometry follows the NOAA general solar position approach:
//! Spencer (1971) series for declination and equation of time, evaluated at
//! solar noon of the date, and the sunrise hour angle for a zenith of 90.833°
//! (refraction plus the solar disc radius). Accuracy is within a couple of
//! minutes at mid latitudes, which is far below the 15-minute bucket width.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const DEG: f64 = PI / 180.0;
/// Zenith angle of the sun's upper limb at apparent sunrise/sunset, in degrees.
const SUNRISE_ZENITH_DEG: f64 = 90.833;

/// Fixed observer location in decimal degrees (latitude north, longitude east positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observer {
    /// Latitude, -90..=90.
    pub latitude: f64,
    /// Longitude, -180..=180, east positive.
    pub longitude: f64,
}

impl Observer {
    /// Brussels, Belgium.
    pub const BRUSSELS: Observer = Observer {
        latitude: 50.8503,
        longitude: 4.3517,
    };
}

impl Default for Observer {
    fn default() -> Self {
        Self::BRUSSELS
    }
}

/// Daylight on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Daylight {
    /// The sun rises and sets.
    Interval {
        /// Apparent sunrise (UTC).
        sunrise: DateTime<Utc>,
        /// Apparent sunset (UTC).
        sunset: DateTime<Utc>,
    },
    /// The sun stays below the horizon all day.
    PolarNight,
    /// The sun stays above the horizon all day.
    MidnightSun,
}

/// Sunrise and sunset on `date` for `observer`.
pub fn daylight(date: NaiveDate, observer: &Observer) -> Daylight {
    let doy = f64::from(date.ordinal());
    let days_in_year =
        NaiveDate::from_ymd_opt(date.year(), 12, 31).map_or(365.0, |d| f64::from(d.ordinal()));
    // fractional year at solar noon
    let g = 2.0 * PI / days_in_year * (doy - 1.0);

    let eot_min = 229.18
        * (0.000075 + 0.001868 * g.cos()
            - 0.032077 * g.sin()
            - 0.014615 * (2.0 * g).cos()
            - 0.040849 * (2.0 * g).sin());
    let decl = 0.006918 - 0.399912 * g.cos() + 0.070257 * g.sin()
        - 0.006758 * (2.0 * g).cos()
        + 0.000907 * (2.0 * g).sin()
        - 0.002697 * (3.0 * g).cos()
        + 0.00148 * (3.0 * g).sin();

    let lat = observer.latitude * DEG;
    let cos_ha = (SUNRISE_ZENITH_DEG * DEG).cos() / (lat.cos() * decl.cos()) - lat.tan() * decl.tan();
    if cos_ha > 1.0 {
        return Daylight::PolarNight;
    }
    if cos_ha < -1.0 {
        return Daylight::MidnightSun;
    }
    let ha_deg = cos_ha.acos() / DEG;

    let sunrise_min = 720.0 - 4.0 * (observer.longitude + ha_deg) - eot_min;
    let sunset_min = 720.0 - 4.0 * (observer.longitude - ha_deg) - eot_min;

    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    Daylight::Interval {
        sunrise: midnight + minutes_f64(sunrise_min),
        sunset: midnight + minutes_f64(sunset_min),
    }
}

fn minutes_f64(minutes: f64) -> Duration {
    Duration::seconds((minutes * 60.0).round() as i64)
}
