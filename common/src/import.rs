//! Matching of imported tabular records to template fields.
//!
//! Columns are matched to fields by name, case-insensitively and ignoring
//! surrounding whitespace. Fields without a matching column get `""`.

use crate::field_store::FieldStore;
use crate::model::data::DataRow;
use std::collections::HashMap;

/// Candidate delimiters, in tie-break order.
pub const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Picks the delimiter occurring most often in the header line.
pub fn detect_delimiter(header_line: &str) -> char {
    DELIMITERS
        .iter()
        .copied()
        .rev()
        .max_by_key(|&d| header_line.matches(d).count())
        .unwrap_or(',')
}

/// Trims a cell and turns non-breaking spaces into plain spaces.
pub fn normalize_cell(cell: &str) -> String {
    cell.replace('\u{00A0}', " ").trim().to_string()
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Value of the first column whose header matches `field_name`.
pub fn match_field_value<'a>(headers: &[String], record: &'a [String], field_name: &str) -> &'a str {
    headers
        .iter()
        .position(|h| same_name(h, field_name))
        .and_then(|i| record.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

/// Names of the fields that have a matching column.
pub fn matched_fields(headers: &[String], schema: &FieldStore) -> Vec<String> {
    schema
        .iter()
        .filter(|f| headers.iter().any(|h| same_name(h, &f.name)))
        .map(|f| f.name.clone())
        .collect()
}

/// Field id to value map for one record.
pub fn record_values(headers: &[String], record: &[String], schema: &FieldStore) -> HashMap<String, String> {
    schema
        .iter()
        .map(|f| (f.id.clone(), normalize_cell(match_field_value(headers, record, &f.name))))
        .collect()
}

/// One data row per record, in record order.
pub fn rows_from_records(
    template_id: &str,
    session_id: &str,
    headers: &[String],
    records: &[Vec<String>],
    schema: &FieldStore,
) -> Vec<DataRow> {
    records
        .iter()
        .map(|record| DataRow::new(template_id, session_id, record_values(headers, record, schema)))
        .collect()
}
