use crate::ids::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One set of field values; each row becomes exactly one generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRow {
    pub id: String,
    pub template_id: String,
    pub session_id: String,
    /// Field id to value. Missing ids are treated as empty strings.
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl DataRow {
    pub fn new(
        template_id: impl Into<String>,
        session_id: impl Into<String>,
        values: HashMap<String, String>,
    ) -> Self {
        Self {
            id: generate_id("row"),
            template_id: template_id.into(),
            session_id: session_id.into(),
            values,
        }
    }

    pub fn value_for(&self, field_id: &str) -> &str {
        self.values.get(field_id).map(String::as_str).unwrap_or("")
    }
}

/// A named, timestamped batch of data rows tied to one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSession {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataSession {
    pub fn new(template_id: impl Into<String>, template_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id("session"),
            template_id: template_id.into(),
            name: default_session_name(template_name, now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>, now: DateTime<Utc>) {
        self.name = name.into();
        self.updated_at = now;
    }
}

/// `"{template name} - Oct 18, 2026"`.
pub fn default_session_name(template_name: &str, now: DateTime<Utc>) -> String {
    format!("{} - {}", template_name, now.format("%b %-d, %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_values_read_as_empty() {
        let mut values = HashMap::new();
        values.insert("field_a".to_string(), "Bob".to_string());
        let row = DataRow::new("template_1", "session_1", values);

        assert_eq!(row.value_for("field_a"), "Bob");
        assert_eq!(row.value_for("field_b"), "");
    }

    #[test]
    fn session_name_defaults_to_template_and_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 9, 30, 0).unwrap();
        let mut session = DataSession::new("template_1", "Offer Letter", now);
        assert_eq!(session.name, "Offer Letter - Mar 7, 2026");

        let later = Utc.with_ymd_and_hms(2026, 3, 8, 9, 30, 0).unwrap();
        session.rename("Spring hires", later);
        assert_eq!(session.name, "Spring hires");
        assert_eq!(session.created_at, now);
        assert_eq!(session.updated_at, later);
    }
}
