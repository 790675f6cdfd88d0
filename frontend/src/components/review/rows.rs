//! Manual row editing and generated-document previews.

use std::collections::HashMap;

use common::model::data::DataRow;
use common::preview::PreviewDocument;
use common::text::extract_plain_text;

/// Characters of a generated document shown next to its file name.
pub const EXCERPT_CHARS: usize = 80;

/// An empty row appended to the session, one blank cell per field.
pub fn blank_row(template_id: &str, session_id: &str, field_ids: &[&str]) -> DataRow {
    let values: HashMap<String, String> = field_ids
        .iter()
        .map(|id| (id.to_string(), String::new()))
        .collect();
    DataRow::new(template_id, session_id, values)
}

/// Sets one cell. Returns false when the row does not exist or the value is unchanged.
pub fn set_cell(rows: &mut [DataRow], index: usize, field_id: &str, value: String) -> bool {
    let Some(row) = rows.get_mut(index) else {
        return false;
    };
    if row.value_for(field_id) == value {
        return false;
    }
    row.values.insert(field_id.to_string(), value);
    true
}

/// Removes the row at `index`, keeping the order of the rest.
pub fn delete_row(rows: &mut Vec<DataRow>, index: usize) -> Option<DataRow> {
    (index < rows.len()).then(|| rows.remove(index))
}

/// Whitespace-collapsed opening text of a generated document.
pub fn document_excerpt(document: &[u8], max_chars: usize) -> Option<String> {
    let preview = PreviewDocument::from_docx(document).ok()?;
    let text = extract_plain_text(&preview.flattened_text());
    if text.chars().count() <= max_chars {
        return Some(text);
    }
    let mut excerpt: String = text.chars().take(max_chars).collect();
    excerpt.push('…');
    Some(excerpt)
}
