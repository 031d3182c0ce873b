use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use interview_core::catalog::CatalogMeta;
use interview_core::metrics::Metrics;
use interview_core::model::{QuestionId, Response};

/// Externally consumable session report.
///
/// The one artifact this system exports: computed metrics plus the full
/// response ledger and enough context (meta, history, topic filter) to
/// interpret them without the live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub generated_at: DateTime<Utc>,
    pub meta: CatalogMeta,
    pub history: Vec<QuestionId>,
    pub selected_topics: Vec<String>,
    pub select_all_topics: bool,
    pub metrics: Metrics,
    pub responses: Vec<Response>,
}

impl SessionReport {
    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if encoding fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
