//! Series source backed by a warehouse JSON export on disk.
//!
//! Layout:
//! - `<root>/timeseries.json`: array of [`SeriesMeta`] in the warehouse shape
//!   (`id`, `name`, `vaultName`, `fieldNames`, `period`).
//! - `<root>/values/<id>.json`: array of `{"start": "<RFC3339>", "values": [..]}`.
//!
//! A missing values file means the series has no readings yet.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    errors::SourceError,
    models::{data_point::DataPoint, filter::SeriesFilter, series_meta::SeriesMeta},
    providers::{SeriesSource, window_points},
};

const METADATA_FILE: &str = "timeseries.json";
const VALUES_DIR: &str = "values";

/// Reads series from a directory export.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    /// Source rooted at `root`. Nothing is read until the first call.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
        let shown = path.display().to_string();
        let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::Io {
            path: shown.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| SourceError::Decode { path: shown, source })
    }

    async fn all_series(&self) -> Result<Vec<SeriesMeta>, SourceError> {
        let mut metas: Vec<SeriesMeta> = Self::read_json(&self.root.join(METADATA_FILE)).await?;
        metas.sort_by_key(|m| m.id);
        Ok(metas)
    }
}

#[async_trait]
impl SeriesSource for JsonDirSource {
    async fn list_series(&self, filter: &SeriesFilter) -> Result<Vec<SeriesMeta>, SourceError> {
        Ok(self
            .all_series()
            .await?
            .into_iter()
            .filter(|meta| filter.matches(meta))
            .collect())
    }

    async fn get_datapoints(
        &self,
        id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, SourceError> {
        if to <= from {
            return Err(SourceError::Validation(format!(
                "empty window {from} .. {to}"
            )));
        }
        if !self.all_series().await?.iter().any(|m| m.id == id) {
            return Err(SourceError::UnknownSeries(id));
        }

        let path = self.root.join(VALUES_DIR).join(format!("{id}.json"));
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(series_id = id, path = %path.display(), "no values file; series is empty");
                return Ok(vec![]);
            }
            Err(source) => {
                return Err(SourceError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        }
        let points: Vec<DataPoint> = Self::read_json(&path).await?;
        Ok(window_points(points, from, to))
    }
}
