//! Splits text leaves at field boundaries so each field can be drawn as its
//! own highlighted span. Splitting never changes the concatenated text.

use crate::model::field::Field;
use crate::text::{slice_utf16, utf16_len};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    /// Flattened offset of the first unit of `text`.
    pub start: usize,
    /// Field covering this segment, if any.
    pub field_id: Option<String>,
}

/// Cuts `text`, which starts at flattened offset `leaf_start`, into plain and
/// field-covered segments. Fields must not overlap.
pub fn segment_leaf(text: &str, leaf_start: usize, fields: &[Field]) -> Vec<Segment> {
    let leaf_end = leaf_start + utf16_len(text);

    let mut covering: Vec<&Field> = fields
        .iter()
        .filter(|f| f.start_position < leaf_end && f.end_position > leaf_start)
        .collect();
    covering.sort_by_key(|f| f.start_position);

    let mut segments = Vec::new();
    let mut cursor = leaf_start;
    let mut push = |from: usize, to: usize, field_id: Option<&str>| {
        if from >= to {
            return;
        }
        if let Some(part) = slice_utf16(text, from - leaf_start, to - leaf_start) {
            segments.push(Segment {
                text: part.to_string(),
                start: from,
                field_id: field_id.map(str::to_string),
            });
        }
    };

    for field in covering {
        let from = field.start_position.max(leaf_start);
        let to = field.end_position.min(leaf_end);
        push(cursor, from, None);
        push(from, to, Some(&field.id));
        cursor = to;
    }
    push(cursor, leaf_end, None);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldType;
    use pretty_assertions::assert_eq;

    fn field(id: &str, start: usize, end: usize) -> Field {
        Field {
            id: id.into(),
            name: id.into(),
            placeholder: "x".into(),
            field_type: FieldType::Text,
            start_position: start,
            end_position: end,
        }
    }

    #[test]
    fn splits_at_field_edges() {
        // Leaf "Dear NAME_HERE," at offset 10.
        let segments = segment_leaf("Dear NAME_HERE,", 10, &[field("f1", 15, 24)]);
        let parts: Vec<(&str, Option<&str>)> =
            segments.iter().map(|s| (s.text.as_str(), s.field_id.as_deref())).collect();
        assert_eq!(parts, vec![("Dear ", None), ("NAME_HERE", Some("f1")), (",", None)]);
        assert_eq!(segments[1].start, 15);
    }

    #[test]
    fn field_spanning_leaves_is_clipped() {
        let fields = [field("f1", 3, 12), field("f2", 12, 14)];
        let segments = segment_leaf("abcdefgh", 8, &fields);
        let parts: Vec<(&str, Option<&str>)> =
            segments.iter().map(|s| (s.text.as_str(), s.field_id.as_deref())).collect();
        assert_eq!(parts, vec![("abcd", Some("f1")), ("ef", Some("f2")), ("gh", None)]);
    }

    #[test]
    fn concatenation_is_unchanged() {
        let text = "Zoë 😀 owes 0.00";
        let fields = [field("f1", 4, 6), field("f2", 12, 16)];
        let joined: String = segment_leaf(text, 0, &fields).into_iter().map(|s| s.text).collect();
        assert_eq!(joined, text);
    }
}
