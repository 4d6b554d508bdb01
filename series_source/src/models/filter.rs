//! Selection criteria for [`SeriesSource::list_series`](crate::SeriesSource::list_series).

use crate::models::series_meta::SeriesMeta;

/// Filter on series metadata. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Exact name match.
    pub name: Option<String>,
}

impl SeriesFilter {
    /// Match every series of a category.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            name: None,
        }
    }

    /// Match the series with this name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            category: None,
            name: Some(name.into()),
        }
    }

    /// Whether `meta` satisfies every set criterion.
    pub fn matches(&self, meta: &SeriesMeta) -> bool {
        self.category.as_deref().is_none_or(|c| c == meta.category)
            && self.name.as_deref().is_none_or(|n| n == meta.name)
    }
}
