//! Injected energy split by the sign of the price.

use tracing::warn;

use crate::analysis::slice_in;
use crate::calendar::CalendarWindow;
use crate::error::StatsResult;
use crate::join::{Aligned, JoinMode, join};
use crate::series::{MeterPoint, MeterSeries, PricePoint, PriceSeries};
use crate::statistic::{RunStamp, StatKey, StatisticRow};

/// Injection of one month, partitioned by price sign. A zero price counts as positive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InjectionSplit {
    pub positive: f64,
    pub negative: f64,
}

impl InjectionSplit {
    pub fn total(&self) -> f64 {
        self.positive + self.negative
    }

    /// Share of injection at negative prices, in percent; 0 when nothing was injected.
    pub fn negative_pct(&self) -> f64 {
        let total = self.total();
        if total == 0.0 { 0.0 } else { 100.0 * self.negative / total }
    }

    fn add(&mut self, injection: f64, price: f64) {
        if price >= 0.0 {
            self.positive += injection;
        } else {
            self.negative += injection;
        }
    }
}

pub fn split(aligned: &[Aligned<MeterPoint, PricePoint>]) -> InjectionSplit {
    aligned.iter().fold(InjectionSplit::default(), |mut acc, a| {
        acc.add(a.primary.injection, a.secondary.price);
        acc
    })
}

/// Three rows per month window that has priced buckets.
///
/// Months without any matched price are skipped with a warning.
pub fn injection_rows(
    stamp: &RunStamp,
    meter: &MeterSeries,
    prices: &PriceSeries,
    months: &[CalendarWindow],
) -> StatsResult<Vec<StatisticRow>> {
    let aligned = join(&meter.points, &prices.points, JoinMode::Inner)?;
    let mut rows = Vec::with_capacity(months.len() * 3);
    for month in months {
        let priced = slice_in(&aligned, month);
        if priced.is_empty() {
            warn!(series_id = meter.id, month = %month.period, prices = %prices.name, "no prices for month; injection split skipped");
            continue;
        }
        let s = split(priced);
        let window = (month.start, month.end);
        rows.push(stamp.row(
            meter.id,
            StatKey::injection_pos_priced(),
            s.positive,
            "Injected kWh with positive price",
            window,
        ));
        rows.push(stamp.row(
            meter.id,
            StatKey::injection_neg_priced(),
            s.negative,
            "Injected kWh with negative price",
            window,
        ));
        rows.push(stamp.row(
            meter.id,
            StatKey::injection_neg_price_pct(),
            s.negative_pct(),
            "Percentage of injected kWh at negative price",
            window,
        ));
    }
    Ok(rows)
}
