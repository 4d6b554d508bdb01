//! Statistic rows, the unit of persistence.

use std::fmt;

use chrono::{DateTime, Utc};

/// Hierarchical statistic key, e.g. `peak/offtake` or `offtake/cost/epex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatKey(String);

impl StatKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn peak_offtake() -> Self {
        Self::new("peak/offtake")
    }

    pub fn minimal_offtake() -> Self {
        Self::new("minimal/offtake")
    }

    pub fn offtake_cost(model: &str) -> Self {
        Self(format!("offtake/cost/{model}"))
    }

    pub fn injection_profit(model: &str) -> Self {
        Self(format!("injection/profit/{model}"))
    }

    pub fn injection_pos_priced() -> Self {
        Self::new("injection/pos_priced")
    }

    pub fn injection_neg_priced() -> Self {
        Self::new("injection/neg_priced")
    }

    pub fn injection_neg_price_pct() -> Self {
        Self::new("injection/neg_price_pct")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One computed statistic.
///
/// Natural key: `(series_id, key, window_start)`. Storing a row replaces every other field of
/// the row with the same natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticRow {
    pub site_id: String,
    pub series_id: i64,
    pub key: StatKey,
    pub value: f64,
    pub description: String,
    pub computed_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// When the statistic happened, for point-in-time metrics such as a peak.
    pub event_time: Option<DateTime<Utc>>,
}

impl StatisticRow {
    pub fn natural_key(&self) -> (i64, &StatKey, DateTime<Utc>) {
        (self.series_id, &self.key, self.window_start)
    }
}

/// Fields shared by every row of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
    pub site_id: String,
    pub computed_at: DateTime<Utc>,
}

impl RunStamp {
    pub fn new(site_id: impl Into<String>, computed_at: DateTime<Utc>) -> Self {
        Self {
            site_id: site_id.into(),
            computed_at,
        }
    }

    /// A row stamped with this run's site and computation time.
    pub fn row(
        &self,
        series_id: i64,
        key: StatKey,
        value: f64,
        description: impl Into<String>,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> StatisticRow {
        StatisticRow {
            site_id: self.site_id.clone(),
            series_id,
            key,
            value,
            description: description.into(),
            computed_at: self.computed_at,
            window_start: window.0,
            window_end: window.1,
            event_time: None,
        }
    }
}
