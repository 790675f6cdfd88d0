//! Turns pointer input on a rendered document into candidate fields.
//!
//! Two input paths exist. A plain drag lets the browser build a native text
//! selection, which is resolved on pointer-up; errors on that path are
//! returned to the caller so the user sees why nothing happened. A drag with
//! the draw modifier held draws a rectangle instead; a rectangle that does
//! not produce a valid candidate is dropped without a message.

use crate::model::field::Field;
use crate::overlap::first_overlapping;
use crate::position_map::{
    OffsetRange, PositionMap, Point, Rect, RenderedDocument, SelectionRange,
    resolve_bounding_box_to_offsets,
};
use crate::text::{slice_utf16, utf16_len, whitespace_margins};
use log::debug;
use serde::{Deserialize, Serialize};

/// A drawn box must be strictly larger than this in both dimensions.
pub const MIN_BOX_SIZE_PX: f64 = 5.0;

/// Longest accepted placeholder, in UTF-16 units after trimming.
pub const MAX_PLACEHOLDER_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Could not determine selection position")]
    Unmapped,

    #[error("Selection contains no text")]
    EmptyText,

    #[error("Selected text is too long (max {} characters)", MAX_PLACEHOLDER_LEN)]
    TooLong { len: usize },

    #[error("Selection overlaps with existing field")]
    Overlap { existing: String },
}

/// Trimmed, validated range ready to become a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub start_position: usize,
    pub end_position: usize,
    pub placeholder: String,
}

/// Trims and validates a resolved range against the flattened text and the
/// fields already defined.
///
/// A collapsed range is "no selection" and yields `Ok(None)`. Whitespace is
/// trimmed by moving the offsets inward, so the stored range covers exactly
/// the placeholder text. Overlap is checked on the trimmed range.
pub fn normalize_candidate(
    range: OffsetRange,
    flattened: &str,
    fields: &[Field],
) -> Result<Option<Candidate>, SelectionError> {
    if range.is_empty() {
        return Ok(None);
    }
    let raw = slice_utf16(flattened, range.start, range.end).ok_or(SelectionError::Unmapped)?;

    let (leading, trailing) = whitespace_margins(raw);
    let start = range.start + leading;
    let end = range.end - trailing;
    if start >= end {
        return Err(SelectionError::EmptyText);
    }

    let placeholder = raw.trim();
    let len = utf16_len(placeholder);
    if len > MAX_PLACEHOLDER_LEN {
        return Err(SelectionError::TooLong { len });
    }

    if let Some(existing) = first_overlapping(start, end, fields) {
        return Err(SelectionError::Overlap {
            existing: existing.name.clone(),
        });
    }

    Ok(Some(Candidate {
        start_position: start,
        end_position: end,
        placeholder: placeholder.to_string(),
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    /// Bounding-box drag in progress, container-local coordinates.
    Drawing { origin: Point, current: Point },
    /// Pointer released without the modifier; the native selection is read next.
    Resolving,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// Box below the size threshold, dropped.
    Discarded,
    BoxDrawn(Rect),
    /// Caller should read the native selection and call
    /// [`SelectionController::resolve_selection`].
    ResolveSelection,
}

/// Per-view gesture state plus the currently active field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionController {
    state: SelectionState,
    active_field: Option<String>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, SelectionState::Drawing { .. })
    }

    /// Rectangle currently being drawn, if any.
    pub fn live_rect(&self) -> Option<Rect> {
        match self.state {
            SelectionState::Drawing { origin, current } => Some(Rect::from_corners(origin, current)),
            _ => None,
        }
    }

    pub fn pointer_down(&mut self, point: Point, draw_modifier: bool) {
        self.state = if draw_modifier {
            SelectionState::Drawing {
                origin: point,
                current: point,
            }
        } else {
            SelectionState::Idle
        };
    }

    /// Returns the updated rectangle while drawing.
    pub fn pointer_move(&mut self, point: Point) -> Option<Rect> {
        if let SelectionState::Drawing { origin, .. } = self.state {
            self.state = SelectionState::Drawing {
                origin,
                current: point,
            };
        }
        self.live_rect()
    }

    pub fn pointer_up(&mut self, point: Point) -> PointerOutcome {
        match self.state {
            SelectionState::Drawing { origin, .. } => {
                self.state = SelectionState::Idle;
                let rect = Rect::from_corners(origin, point);
                if rect.width > MIN_BOX_SIZE_PX && rect.height > MIN_BOX_SIZE_PX {
                    PointerOutcome::BoxDrawn(rect)
                } else {
                    debug!("Discarding {}x{} box", rect.width, rect.height);
                    PointerOutcome::Discarded
                }
            }
            SelectionState::Idle | SelectionState::Resolving => {
                self.state = SelectionState::Resolving;
                PointerOutcome::ResolveSelection
            }
        }
    }

    /// Abandons any gesture in progress.
    pub fn cancel(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Resolves the native selection read after pointer-up. Always returns
    /// to `Idle`.
    pub fn resolve_selection<D: RenderedDocument>(
        &mut self,
        selection: Option<&SelectionRange<D::Node>>,
        doc: &D,
        flattened: &str,
        fields: &[Field],
    ) -> Result<Option<Candidate>, SelectionError> {
        self.state = SelectionState::Idle;
        let Some(selection) = selection else {
            return Ok(None);
        };
        if selection.is_collapsed() {
            return Ok(None);
        }
        let range = PositionMap::build(doc)
            .resolve(selection)
            .ok_or(SelectionError::Unmapped)?;
        normalize_candidate(range, flattened, fields)
    }

    /// Resolves a drawn box. Any failure, overlap included, yields `None`.
    pub fn resolve_box<D: RenderedDocument>(
        &mut self,
        area: &Rect,
        doc: &D,
        flattened: &str,
        fields: &[Field],
    ) -> Option<Candidate> {
        self.state = SelectionState::Idle;
        let hit = resolve_bounding_box_to_offsets(area, doc, flattened)?;
        let range = OffsetRange {
            start: hit.start,
            end: hit.end,
        };
        match normalize_candidate(range, flattened, fields) {
            Ok(candidate) => candidate,
            Err(e) => {
                debug!("Box selection dropped: {}", e);
                None
            }
        }
    }

    pub fn active_field(&self) -> Option<&str> {
        self.active_field.as_deref()
    }

    /// Clicking the active field's highlight again deactivates it.
    pub fn toggle_active_field(&mut self, field_id: &str) -> Option<&str> {
        if self.active_field.as_deref() == Some(field_id) {
            self.active_field = None;
        } else {
            self.active_field = Some(field_id.to_string());
        }
        self.active_field()
    }

    pub fn set_active_field(&mut self, field_id: Option<String>) {
        self.active_field = field_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldType;
    use crate::position_map::{Anchor, flatten_text};
    use crate::testing::MonospaceDocument;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn field(name: &str, start: usize, end: usize) -> Field {
        Field {
            id: format!("field_{}", name),
            name: name.to_string(),
            placeholder: "x".repeat(end - start),
            field_type: FieldType::Text,
            start_position: start,
            end_position: end,
        }
    }

    #[rstest]
    #[case(500, true)]
    #[case(501, false)]
    fn placeholder_length_limit(#[case] len: usize, #[case] accepted: bool) {
        let flattened = format!("  {}  ", "a".repeat(len));
        let range = OffsetRange { start: 0, end: len + 4 };
        let result = normalize_candidate(range, &flattened, &[]);
        if accepted {
            let candidate = result.unwrap().unwrap();
            assert_eq!(candidate.start_position, 2);
            assert_eq!(candidate.end_position, len + 2);
        } else {
            assert_eq!(result, Err(SelectionError::TooLong { len }));
        }
    }

    #[test]
    fn trimming_moves_both_offsets() {
        let flattened = "Dear   Bob Smith ,";
        let candidate = normalize_candidate(OffsetRange { start: 4, end: 17 }, flattened, &[])
            .unwrap()
            .unwrap();
        assert_eq!(
            candidate,
            Candidate {
                start_position: 7,
                end_position: 16,
                placeholder: "Bob Smith".into()
            }
        );
        assert_eq!(
            slice_utf16(flattened, candidate.start_position, candidate.end_position),
            Some("Bob Smith")
        );
    }

    #[test]
    fn whitespace_only_and_collapsed_ranges() {
        let flattened = "a    b";
        assert_eq!(
            normalize_candidate(OffsetRange { start: 1, end: 5 }, flattened, &[]),
            Err(SelectionError::EmptyText)
        );
        assert_eq!(normalize_candidate(OffsetRange { start: 3, end: 3 }, flattened, &[]), Ok(None));
        assert_eq!(
            normalize_candidate(OffsetRange { start: 3, end: 30 }, flattened, &[]),
            Err(SelectionError::Unmapped)
        );
    }

    #[test]
    fn overlap_checked_after_trimming() {
        let flattened = "xxxxxxxxxx  Name  yyyyy";
        // The raw range [10, 18) reaches a field ending at 12 only through spaces.
        let fields = vec![field("Left", 0, 12)];
        let candidate = normalize_candidate(OffsetRange { start: 10, end: 18 }, flattened, &fields)
            .unwrap()
            .unwrap();
        assert_eq!(candidate.placeholder, "Name");

        let fields = vec![field("Left", 0, 13)];
        assert_eq!(
            normalize_candidate(OffsetRange { start: 10, end: 18 }, flattened, &fields),
            Err(SelectionError::Overlap { existing: "Left".into() })
        );
    }

    #[rstest]
    #[case(5.0, PointerOutcome::Discarded)]
    #[case(6.0, PointerOutcome::BoxDrawn(Rect::new(2.0, 7.0, 6.0, 6.0)))]
    fn box_size_threshold(#[case] size: f64, #[case] expected: PointerOutcome) {
        let mut controller = SelectionController::new();
        controller.pointer_down(Point { x: 2.0, y: 7.0 }, true);
        assert!(controller.is_drawing());
        controller.pointer_move(Point { x: 4.0, y: 9.0 });
        let outcome = controller.pointer_up(Point { x: 2.0 + size, y: 7.0 + size });
        assert_eq!(outcome, expected);
        assert_eq!(controller.state(), SelectionState::Idle);
    }

    #[test]
    fn accepted_box_yields_candidate_for_covered_character() {
        let doc = MonospaceDocument::new(&[&["Dear ", "Bob"]]);
        let flattened = flatten_text(&doc);
        let mut controller = SelectionController::new();
        controller.pointer_down(Point { x: 2.0, y: 7.0 }, true);
        let PointerOutcome::BoxDrawn(rect) = controller.pointer_up(Point { x: 8.0, y: 13.0 }) else {
            panic!("box should be accepted");
        };
        let candidate = controller.resolve_box(&rect, &doc, &flattened, &[]).unwrap();
        assert_eq!(candidate.placeholder, "D");
        assert_eq!((candidate.start_position, candidate.end_position), (0, 1));
    }

    #[test]
    fn live_rect_follows_pointer() {
        let mut controller = SelectionController::new();
        assert_eq!(controller.pointer_move(Point { x: 1.0, y: 1.0 }), None);
        controller.pointer_down(Point { x: 10.0, y: 10.0 }, true);
        let rect = controller.pointer_move(Point { x: 4.0, y: 30.0 }).unwrap();
        assert_eq!(rect, Rect::new(4.0, 10.0, 6.0, 20.0));
    }

    #[test]
    fn text_selection_path_surfaces_overlap() {
        let doc = MonospaceDocument::new(&[&["Hello ", "NAME_HERE", " there"]]);
        let flattened = flatten_text(&doc);
        let fields = vec![field("Name", 6, 15)];
        let mut controller = SelectionController::new();

        controller.pointer_down(Point::default(), false);
        assert_eq!(controller.pointer_up(Point::default()), PointerOutcome::ResolveSelection);
        assert_eq!(controller.state(), SelectionState::Resolving);

        let selection = SelectionRange {
            start: Anchor { node: 1, offset: 4 },
            end: Anchor { node: 2, offset: 3 },
        };
        let result = controller.resolve_selection(Some(&selection), &doc, &flattened, &fields);
        assert_eq!(result, Err(SelectionError::Overlap { existing: "Name".into() }));
        assert_eq!(controller.state(), SelectionState::Idle);
    }

    #[test]
    fn box_path_drops_overlap_silently() {
        let doc = MonospaceDocument::new(&[&["Hello ", "NAME_HERE"]]);
        let flattened = flatten_text(&doc);
        let fields = vec![field("Name", 6, 15)];
        let mut controller = SelectionController::new();
        let area = Rect::new(0.0, 0.0, 200.0, 20.0);
        assert_eq!(controller.resolve_box(&area, &doc, &flattened, &fields), None);
    }

    #[test]
    fn text_selection_resolves_trimmed_candidate() {
        let doc = MonospaceDocument::new(&[&["Hello ", "NAME_HERE", " there"]]);
        let flattened = flatten_text(&doc);
        let mut controller = SelectionController::new();
        controller.pointer_up(Point::default());

        let selection = SelectionRange {
            start: Anchor { node: 0, offset: 5 },
            end: Anchor { node: 2, offset: 1 },
        };
        let candidate = controller
            .resolve_selection(Some(&selection), &doc, &flattened, &[])
            .unwrap()
            .unwrap();
        assert_eq!(candidate.placeholder, "NAME_HERE");
        assert_eq!((candidate.start_position, candidate.end_position), (6, 15));

        assert_eq!(controller.resolve_selection(None, &doc, &flattened, &[]), Ok(None));
        let unmapped = SelectionRange {
            start: Anchor { node: 0, offset: 0 },
            end: Anchor { node: 42, offset: 0 },
        };
        assert_eq!(
            controller.resolve_selection(Some(&unmapped), &doc, &flattened, &[]),
            Err(SelectionError::Unmapped)
        );
    }

    #[test]
    fn clicking_active_field_toggles_it() {
        let mut controller = SelectionController::new();
        assert_eq!(controller.toggle_active_field("field_a"), Some("field_a"));
        assert_eq!(controller.toggle_active_field("field_b"), Some("field_b"));
        assert_eq!(controller.toggle_active_field("field_b"), None);
    }
}
