//! One raw reading of a series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single datapoint: the interval start and one value per series field.
///
/// Values are positional and map onto [`SeriesMeta::field_names`](crate::SeriesMeta::field_names).
/// A `None` value is a hole reported by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Interval start (UTC).
    pub start: DateTime<Utc>,
    /// Field values, in the order of the series' field names.
    pub values: Vec<Option<f64>>,
}

impl DataPoint {
    /// Build a point where every value is present.
    pub fn new(start: DateTime<Utc>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            start,
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Value at `index`, flattening holes and out-of-range indices to `None`.
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}
