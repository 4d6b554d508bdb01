//! Offtake cost and injection profit under named pricing models.
//!
//! Per joined bucket: `cost = (scaler * price + adder) * offtake` and
//! `profit = (scaler * price - adder) * injection`. Totals cover the whole analysis window.
//! Buckets without a matching price do not contribute, so models with different price coverage
//! are not directly comparable; the number of joined buckets is written into the description.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StatsError, StatsResult};
use crate::join::{JoinMode, join};
use crate::series::{MeterSeries, PriceSeries};
use crate::statistic::{RunStamp, StatKey, StatisticRow};

/// How a model's price series is prepared before joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDerivation {
    /// Use the series as is, bucket for bucket.
    #[default]
    None,
    /// Reduce to one mean price per local month and carry it over the month.
    MonthlyAverage,
}

impl PriceDerivation {
    pub fn join_mode(self) -> JoinMode {
        match self {
            PriceDerivation::None => JoinMode::Inner,
            PriceDerivation::MonthlyAverage => JoinMode::LeftFill,
        }
    }
}

/// A named price curve with an affine adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingModel {
    /// Key segment, e.g. `epex` in `offtake/cost/epex`.
    pub name: String,
    /// Human label used in descriptions.
    pub label: String,
    pub scaler: f64,
    pub adder: f64,
    pub derive: PriceDerivation,
}

impl PricingModel {
    pub fn new(name: impl Into<String>, label: impl Into<String>, scaler: f64, adder: f64) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            scaler,
            adder,
            derive: PriceDerivation::None,
        }
    }

    pub fn with_derive(mut self, derive: PriceDerivation) -> Self {
        self.derive = derive;
        self
    }

    /// Price applied to offtake.
    pub fn offtake_price(&self, price: f64) -> f64 {
        self.scaler * price + self.adder
    }

    /// Price applied to injection; the adder works against the producer.
    pub fn injection_price(&self, price: f64) -> f64 {
        self.scaler * price - self.adder
    }
}

/// Window totals of one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingTotals {
    pub cost: f64,
    pub profit: f64,
    /// Joined buckets that contributed.
    pub buckets: usize,
}

/// Totals of `model` for `meter` against `prices`.
///
/// Errors with [`StatsError::SeriesMismatch`] if the meter is empty or no bucket joins.
pub fn evaluate_model(
    meter: &MeterSeries,
    prices: &PriceSeries,
    model: &PricingModel,
) -> StatsResult<PricingTotals> {
    let joined = join(&meter.points, &prices.points, model.derive.join_mode())?;
    if joined.is_empty() {
        return Err(StatsError::SeriesMismatch(format!(
            "meter {} and prices {} do not overlap",
            meter.name, prices.name
        )));
    }
    let mut totals = PricingTotals {
        cost: 0.0,
        profit: 0.0,
        buckets: joined.len(),
    };
    for a in &joined {
        totals.cost += model.offtake_price(a.secondary.price) * a.primary.offtake;
        totals.profit += model.injection_price(a.secondary.price) * a.primary.injection;
    }
    Ok(totals)
}

/// Evaluates a list of models against the same meter.
#[derive(Debug, Clone, Default)]
pub struct PricingEvaluator {
    models: Vec<PricingModel>,
}

impl PricingEvaluator {
    pub fn new(models: Vec<PricingModel>) -> Self {
        Self { models }
    }

    /// Cost and profit rows for every model that has prices in `prices` (keyed by model name).
    ///
    /// Models without prices or without overlap are skipped; the others still produce rows.
    pub fn evaluate(
        &self,
        stamp: &RunStamp,
        meter: &MeterSeries,
        window: (DateTime<Utc>, DateTime<Utc>),
        prices: &IndexMap<String, PriceSeries>,
    ) -> Vec<StatisticRow> {
        let mut rows = Vec::with_capacity(self.models.len() * 2);
        for model in &self.models {
            let Some(series) = prices.get(&model.name) else {
                debug!(series_id = meter.id, model = %model.name, "no prices for model");
                continue;
            };
            let totals = match evaluate_model(meter, series, model) {
                Ok(t) => t,
                Err(e) => {
                    warn!(series_id = meter.id, model = %model.name, error = %e, "pricing model skipped");
                    continue;
                }
            };
            debug!(
                series_id = meter.id,
                model = %model.name,
                buckets = totals.buckets,
                cost = totals.cost,
                profit = totals.profit,
                "pricing evaluated"
            );
            rows.push(stamp.row(
                meter.id,
                StatKey::offtake_cost(&model.name),
                totals.cost,
                format!("Offtake cost according to {} ({} buckets)", model.label, totals.buckets),
                window,
            ));
            rows.push(stamp.row(
                meter.id,
                StatKey::injection_profit(&model.name),
                totals.profit,
                format!("Injection profit according to {} ({} buckets)", model.label, totals.buckets),
                window,
            ));
        }
        rows
    }
}
