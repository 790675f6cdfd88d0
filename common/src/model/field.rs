use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of value types a field can hold.
///
/// The type only drives presentation (highlight color, badge, icon) and the
/// label shown in the field list; values are always substituted as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
}

/// Static styling tuple for one field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldStyle {
    /// Highlight background for an inactive field.
    pub background: &'static str,
    /// Highlight background while the field is the active one.
    pub background_active: &'static str,
    /// Underline / card border color.
    pub border: &'static str,
    /// CSS class for the type badge in the field list.
    pub badge_class: &'static str,
    /// Material icon name.
    pub icon: &'static str,
}

impl FieldType {
    pub const ALL: [FieldType; 3] = [FieldType::Text, FieldType::Number, FieldType::Date];

    pub fn style(self) -> FieldStyle {
        match self {
            FieldType::Text => FieldStyle {
                background: "rgba(63, 138, 226, 0.2)",
                background_active: "rgba(63, 138, 226, 0.35)",
                border: "#3F8AE2",
                badge_class: "badge badge-text",
                icon: "text_fields",
            },
            FieldType::Number => FieldStyle {
                background: "rgba(0, 235, 130, 0.2)",
                background_active: "rgba(0, 235, 130, 0.35)",
                border: "#00eb82",
                badge_class: "badge badge-number",
                icon: "tag",
            },
            FieldType::Date => FieldStyle {
                background: "rgba(174, 51, 236, 0.2)",
                background_active: "rgba(174, 51, 236, 0.35)",
                border: "#AE33EC",
                badge_class: "badge badge-date",
                icon: "event",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Number => "Number",
            FieldType::Date => "Date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            other => Err(format!("unknown field type '{}'", other)),
        }
    }
}

/// A named, typed binding between a placeholder in a template and a column
/// of tabular data.
///
/// `placeholder`, `start_position` and `end_position` are fixed when the
/// field is created; only `name` and `field_type` can change afterwards.
/// Offsets are UTF-16 code units into the template's flattened text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    /// Literal text captured at `[start_position, end_position)`; this is the
    /// key used for substitution at generation time.
    pub placeholder: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub start_position: usize,
    pub end_position: usize,
}

impl Field {
    pub fn range(&self) -> (usize, usize) {
        (self.start_position, self.end_position)
    }
}

/// Everything needed to create a field; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDraft {
    pub name: String,
    pub placeholder: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub start_position: usize,
    pub end_position: usize,
}

/// Editable attributes of an existing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_serializes_with_wire_names() {
        let field = Field {
            id: "field_1".to_string(),
            name: "Company".to_string(),
            placeholder: "{{Company}}".to_string(),
            field_type: FieldType::Number,
            start_position: 3,
            end_position: 14,
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["startPosition"], 3);
        assert_eq!(json["endPosition"], 14);
    }

    #[test]
    fn every_type_has_distinct_style() {
        let borders: Vec<&str> = FieldType::ALL.iter().map(|t| t.style().border).collect();
        assert_eq!(borders, vec!["#3F8AE2", "#00eb82", "#AE33EC"]);
        assert_eq!("Date".parse::<FieldType>(), Ok(FieldType::Date));
        assert!("currency".parse::<FieldType>().is_err());
    }
}
