use crate::model::field::Field;

/// Returns `true` when `[start, end)` shares at least one offset with an
/// existing field.
///
/// Ranges that only touch (`end == field.start_position`) do not overlap.
pub fn has_overlap(start: usize, end: usize, existing: &[Field]) -> bool {
    existing
        .iter()
        .any(|field| start < field.end_position && end > field.start_position)
}

/// The first field overlapping `[start, end)`, if any.
pub fn first_overlapping(start: usize, end: usize, existing: &[Field]) -> Option<&Field> {
    existing
        .iter()
        .find(|field| start < field.end_position && end > field.start_position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldType;
    use rstest::rstest;

    fn field(id: &str, start: usize, end: usize) -> Field {
        Field {
            id: id.to_string(),
            name: id.to_string(),
            placeholder: "x".repeat(end - start),
            field_type: FieldType::Text,
            start_position: start,
            end_position: end,
        }
    }

    #[rstest]
    #[case(0, 10, false)]
    #[case(20, 30, false)]
    #[case(9, 11, true)]
    #[case(19, 21, true)]
    #[case(12, 18, true)]
    #[case(5, 25, true)]
    fn boundary_touching_is_not_overlap(#[case] start: usize, #[case] end: usize, #[case] expected: bool) {
        let fields = vec![field("a", 10, 20)];
        assert_eq!(has_overlap(start, end, &fields), expected);
    }

    #[test]
    fn touching_fields_accepted_and_straddling_rejected() {
        let fields = vec![field("a", 10, 20), field("b", 20, 30)];
        assert!(!has_overlap(10, 20, &fields[1..]));
        assert!(!has_overlap(20, 30, &fields[..1]));
        assert!(has_overlap(15, 25, &fields));
        assert_eq!(first_overlapping(15, 25, &fields).map(|f| f.id.as_str()), Some("a"));
        assert!(!has_overlap(15, 25, &[]));
    }
}
