//! Series metadata as listed by the warehouse.

use serde::{Deserialize, Serialize};

/// Describes one series: identity, category and record layout.
///
/// Serialized in the warehouse's camelCase shape (`vaultName`, `fieldNames`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMeta {
    /// Warehouse series id.
    pub id: i64,
    /// Unique series name (e.g., "Epex/BE/15").
    pub name: String,
    /// Storage category (e.g., "digital_meter", "prices").
    #[serde(rename = "vaultName")]
    pub category: String,
    /// Ordered field names of each datapoint (e.g., ["offtake", "injection"]).
    #[serde(default)]
    pub field_names: Vec<String>,
    /// ISO-8601 reading period (e.g., "PT15M").
    #[serde(default)]
    pub period: Option<String>,
}

impl SeriesMeta {
    /// Position of a field in the datapoint value vector.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.field_names.iter().position(|f| f == field)
    }
}
