//! Metric computations over one meter.
//!
//! Each analysis turns a [`MeterSeries`](crate::series::MeterSeries) (plus prices or calendar
//! windows where needed) into [`StatisticRow`](crate::statistic::StatisticRow)s. Analyses are
//! pure; fetching and persistence live in [`crate::runner`].

pub mod baseload;
pub mod injection;
pub mod peaks;
pub mod pricing;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bucket::BUCKETS_PER_HOUR;
use crate::calendar::CalendarWindow;
use crate::series::Bucketed;

pub use baseload::baseload_rows;
pub use injection::injection_rows;
pub use peaks::peak_rows;
pub use pricing::{PriceDerivation, PricingEvaluator, PricingModel};

/// Selectable analyses of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    Pricing,
    Peaks,
    Baseload,
    Injection,
}

impl Analysis {
    pub const ALL: [Analysis; 4] = [
        Analysis::Pricing,
        Analysis::Peaks,
        Analysis::Baseload,
        Analysis::Injection,
    ];
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Analysis::Pricing => "pricing",
            Analysis::Peaks => "peaks",
            Analysis::Baseload => "baseload",
            Analysis::Injection => "injection",
        })
    }
}

/// 15-minute energy to average power over the bucket.
pub(crate) fn to_power(energy: f64) -> f64 {
    energy * BUCKETS_PER_HOUR as f64
}

/// The sub-slice of `points` (sorted by bucket) falling inside `window`.
pub(crate) fn slice_in<'a, P: Bucketed>(points: &'a [P], window: &CalendarWindow) -> &'a [P] {
    let lo = points.partition_point(|p| p.bucket().start_utc() < window.start);
    let hi = points.partition_point(|p| p.bucket().start_utc() < window.end);
    &points[lo..hi]
}
