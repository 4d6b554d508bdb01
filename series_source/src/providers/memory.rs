//! In-memory series source.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    errors::SourceError,
    models::{data_point::DataPoint, filter::SeriesFilter, series_meta::SeriesMeta},
    providers::{SeriesSource, window_points},
};

/// Holds series metadata and readings in memory, keyed by series id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    series: BTreeMap<i64, (SeriesMeta, Vec<DataPoint>)>,
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series with its readings, replacing any series with the same id.
    pub fn insert(&mut self, meta: SeriesMeta, points: Vec<DataPoint>) -> &mut Self {
        self.series.insert(meta.id, (meta, points));
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_series(mut self, meta: SeriesMeta, points: Vec<DataPoint>) -> Self {
        self.insert(meta, points);
        self
    }
}

#[async_trait]
impl SeriesSource for MemorySource {
    async fn list_series(&self, filter: &SeriesFilter) -> Result<Vec<SeriesMeta>, SourceError> {
        Ok(self
            .series
            .values()
            .map(|(meta, _)| meta)
            .filter(|meta| filter.matches(meta))
            .cloned()
            .collect())
    }

    async fn get_datapoints(
        &self,
        id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, SourceError> {
        let (_, points) = self.series.get(&id).ok_or(SourceError::UnknownSeries(id))?;
        Ok(window_points(points.iter().cloned(), from, to))
    }
}
