use crate::field_store::FieldStore;
use crate::ids::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded `.docx` together with the fields marked on it.
///
/// `original_document` is never modified after upload. `schema` only changes
/// through [`FieldStore`] operations, which keep fields non-overlapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(with = "crate::model::base64_bytes")]
    pub original_document: Vec<u8>,
    pub schema: FieldStore,
    pub created_at: DateTime<Utc>,
}

impl Template {
    /// Creates a template with a fresh id and an empty schema.
    pub fn new(name: impl Into<String>, original_document: Vec<u8>) -> Self {
        Self {
            id: generate_id("template"),
            name: name.into(),
            original_document,
            schema: FieldStore::default(),
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            field_count: self.schema.len(),
            created_at: self.created_at,
        }
    }
}

/// Lightweight listing entry; does not carry the document bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub field_count: usize,
    pub created_at: DateTime<Utc>,
}
