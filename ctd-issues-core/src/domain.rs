//! Domain entities for CTD processing issues.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cast fields requested from the Hakai CTD cast view.
pub const CAST_FIELDS: [&str; 6] = [
    "organization",
    "work_area",
    "station",
    "device_model",
    "hakai_id",
    "process_error",
];

/// A single CTD cast row returned by the Hakai API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CastRecord {
    /// Organization that owns the cast.
    #[serde(default)]
    pub organization: Option<String>,
    /// Work area the station belongs to.
    #[serde(default)]
    pub work_area: Option<String>,
    /// Station name.
    #[serde(default)]
    pub station: Option<String>,
    /// CTD instrument model.
    #[serde(default)]
    pub device_model: Option<String>,
    /// Unique cast identifier.
    #[serde(default)]
    pub hakai_id: Option<String>,
    /// Raw error reported by the processing tool, often a JSON document.
    #[serde(default)]
    pub process_error: Option<String>,
}

impl CastRecord {
    /// Returns the process error when it is present and non-empty.
    pub fn failure(&self) -> Option<&str> {
        self.process_error
            .as_deref()
            .filter(|error| !error.is_empty())
    }
}

/// Casts sharing one organization, work area and normalised error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IssueSummary {
    /// Organization that owns the affected casts.
    pub organization: String,
    /// Work area of the affected casts.
    pub work_area: String,
    /// Normalised error message used as the issue title.
    pub process_error_message: String,
    /// Preview of affected cast ids, truncated with `...`.
    pub hakai_ids: Vec<String>,
    /// Number of affected casts that carry a hakai id.
    pub hakai_id_count: usize,
    /// Raw error of the first cast in the group.
    pub process_error: String,
    /// Station of every affected cast, in cast order.
    pub stations: Vec<String>,
}

impl IssueSummary {
    /// Title used for tracking issues.
    pub fn title(&self) -> &str {
        &self.process_error_message
    }

    /// Labels applied to tracking issues.
    pub fn labels(&self) -> Vec<String> {
        vec![self.organization.clone(), self.work_area.clone()]
    }
}
