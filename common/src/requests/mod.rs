//! Payloads exchanged between the frontend and the backend API.

use serde::{Deserialize, Serialize};

/// `json` part of a template upload; the `file` part follows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTemplateRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    pub template_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameSessionRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMergeRequest {
    pub template_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMergeResponse {
    pub job_id: String,
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportResult {
    pub imported: usize,
    /// Field names that matched a column header.
    pub matched_fields: Vec<String>,
}
