use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of one generation run for one data row. Never persisted; it only
/// lives for the review and download flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub id: String,
    pub template_id: String,
    pub data_row_id: String,
    #[serde(with = "crate::model::base64_bytes")]
    pub document: Vec<u8>,
    pub created_at: DateTime<Utc>,
}
