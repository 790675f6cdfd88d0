//! Offset index over the text leaves of a rendered document.
//!
//! A rendered document is anything that can enumerate its text-bearing leaves
//! in document order and, optionally, measure characters on screen. The live
//! DOM adapter in the frontend and [`crate::preview::PreviewDocument`] both
//! implement [`RenderedDocument`]; everything in this module is pure offset
//! algebra on top of that trait.

use crate::text::{slice_utf16, utf16_len};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Normalized rectangle spanned by two corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }

    /// Edges are inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right() && point.y >= self.top && point.y <= self.bottom()
    }
}

/// A document whose text leaves can be enumerated and measured.
pub trait RenderedDocument {
    /// Opaque handle to one text leaf.
    type Node: Clone + PartialEq;

    /// All text-bearing leaves, pre-order depth-first.
    fn text_leaves(&self) -> Vec<Self::Node>;

    fn leaf_text(&self, node: &Self::Node) -> String;

    /// On-screen rectangle of UTF-16 units `[start, end)` of `node`, in the
    /// same coordinate space as the boxes passed to
    /// [`resolve_bounding_box_to_offsets`]. `None` when the document has no
    /// layout.
    fn char_rect(&self, node: &Self::Node, start: usize, end: usize) -> Option<Rect>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionMapEntry<N> {
    pub node: N,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl<N> PositionMapEntry<N> {
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

/// Node plus UTF-16 offset inside that node.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor<N> {
    pub node: N,
    pub offset: usize,
}

/// Start and end anchors of a user selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRange<N> {
    pub start: Anchor<N>,
    pub end: Anchor<N>,
}

impl<N: PartialEq> SelectionRange<N> {
    pub fn is_collapsed(&self) -> bool {
        self.start.node == self.end.node && self.start.offset == self.end.offset
    }
}

/// Half-open range in the flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRange {
    pub start: usize,
    pub end: usize,
}

impl OffsetRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Result of a bounding-box lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxSelection {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Ordered, gapless partition of `[0, total_len)` over the text leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMap<N> {
    entries: Vec<PositionMapEntry<N>>,
    total_len: usize,
}

impl<N: Clone + PartialEq> PositionMap<N> {
    pub fn build<D>(doc: &D) -> Self
    where
        D: RenderedDocument<Node = N>,
    {
        let mut entries = Vec::new();
        let mut running = 0;
        for node in doc.text_leaves() {
            let len = utf16_len(&doc.leaf_text(&node));
            entries.push(PositionMapEntry {
                node,
                start_offset: running,
                end_offset: running + len,
            });
            running += len;
        }
        Self { entries, total_len: running }
    }

    pub fn entries(&self) -> &[PositionMapEntry<N>] {
        &self.entries
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }

    pub fn entry_for(&self, node: &N) -> Option<&PositionMapEntry<N>> {
        self.entries.iter().find(|entry| entry.node == *node)
    }

    /// Translates an anchor into a flattened offset. In-node offsets past the
    /// leaf's length clamp to its end.
    pub fn offset_of(&self, anchor: &Anchor<N>) -> Option<usize> {
        self.entry_for(&anchor.node)
            .map(|entry| entry.start_offset + anchor.offset.min(entry.len()))
    }

    /// Anchors each end of a selection. `None` when either node is not a
    /// mapped text leaf.
    pub fn resolve(&self, range: &SelectionRange<N>) -> Option<OffsetRange> {
        let a = self.offset_of(&range.start)?;
        let b = self.offset_of(&range.end)?;
        Some(OffsetRange {
            start: a.min(b),
            end: a.max(b),
        })
    }

    /// Inverse lookup: the entry holding `offset` and the offset inside it.
    ///
    /// A boundary offset belongs to the entry that starts there; the total
    /// length resolves to the end of the last non-empty entry.
    pub fn locate(&self, offset: usize) -> Option<Anchor<N>> {
        if offset > self.total_len {
            return None;
        }
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| offset >= e.start_offset && offset < e.end_offset)
        {
            return Some(Anchor {
                node: entry.node.clone(),
                offset: offset - entry.start_offset,
            });
        }
        self.entries
            .iter()
            .rev()
            .find(|e| !e.is_empty() && e.end_offset == offset)
            .map(|entry| Anchor {
                node: entry.node.clone(),
                offset: entry.len(),
            })
    }
}

/// Canonical flattened text: raw concatenation of every leaf, in order.
pub fn flatten_text<D: RenderedDocument>(doc: &D) -> String {
    doc.text_leaves().iter().map(|node| doc.leaf_text(node)).collect()
}

pub fn build_position_map<D: RenderedDocument>(doc: &D) -> PositionMap<D::Node> {
    PositionMap::build(doc)
}

/// Maps a selection onto the flattened text of `doc`. `None` means the
/// selection touches something that is not a text leaf, such as an image.
pub fn resolve_range_to_offsets<D: RenderedDocument>(
    range: &SelectionRange<D::Node>,
    doc: &D,
) -> Option<OffsetRange> {
    PositionMap::build(doc).resolve(range)
}

/// Finds every character whose on-screen center lies inside `area` and
/// returns the span from the first to the last of them.
///
/// Scans every character of the document, once per gesture.
pub fn resolve_bounding_box_to_offsets<D: RenderedDocument>(
    area: &Rect,
    doc: &D,
    flattened: &str,
) -> Option<BoxSelection> {
    let map = PositionMap::build(doc);
    let mut hit: Option<(usize, usize)> = None;

    for entry in map.entries() {
        let text = doc.leaf_text(&entry.node);
        let mut unit = 0;
        for ch in text.chars() {
            let width = ch.len_utf16();
            let inside = doc
                .char_rect(&entry.node, unit, unit + width)
                .is_some_and(|rect| area.contains(rect.center()));
            if inside {
                let start = entry.start_offset + unit;
                let end = start + width;
                hit = Some(match hit {
                    Some((lo, hi)) => (lo.min(start), hi.max(end)),
                    None => (start, end),
                });
            }
            unit += width;
        }
    }

    let (start, end) = hit?;
    let text = slice_utf16(flattened, start, end)?.to_string();
    Some(BoxSelection { start, end, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MonospaceDocument;
    use pretty_assertions::assert_eq;

    fn doc() -> MonospaceDocument {
        MonospaceDocument::new(&[&["Dear ", "NAME_HERE", ","], &["Total: ", "0.00"]])
    }

    #[test]
    fn map_is_contiguous_and_covers_flattened_text() {
        let doc = doc();
        let map = build_position_map(&doc);
        let flattened = flatten_text(&doc);

        assert_eq!(flattened, "Dear NAME_HERE,Total: 0.00");
        assert_eq!(map.total_len(), utf16_len(&flattened));
        assert_eq!(map.entries()[0].start_offset, 0);
        for pair in map.entries().windows(2) {
            assert_eq!(pair[0].end_offset, pair[1].start_offset);
        }
        assert_eq!(map.entries().last().unwrap().end_offset, map.total_len());
    }

    #[test]
    fn building_twice_is_idempotent() {
        let doc = doc();
        assert_eq!(build_position_map(&doc), build_position_map(&doc));
    }

    #[test]
    fn selection_resolves_to_selected_text() {
        let doc = doc();
        let flattened = flatten_text(&doc);
        let leaves = doc.text_leaves();

        // "NAME_HERE," across two leaves
        let range = SelectionRange {
            start: Anchor { node: leaves[1], offset: 0 },
            end: Anchor { node: leaves[2], offset: 1 },
        };
        let offsets = resolve_range_to_offsets(&range, &doc).unwrap();
        assert_eq!(offsets, OffsetRange { start: 5, end: 15 });
        assert_eq!(slice_utf16(&flattened, offsets.start, offsets.end), Some("NAME_HERE,"));
    }

    #[test]
    fn selection_on_unmapped_node_is_none() {
        let doc = doc();
        let range = SelectionRange {
            start: Anchor { node: 0, offset: 0 },
            end: Anchor { node: 99, offset: 0 },
        };
        assert_eq!(resolve_range_to_offsets(&range, &doc), None);
    }

    #[test]
    fn offsets_count_utf16_units() {
        let doc = MonospaceDocument::new(&[&["😀 ", "Zoë"]]);
        let map = build_position_map(&doc);
        assert_eq!(map.entries()[1].start_offset, 3);
        assert_eq!(map.total_len(), 6);

        let anchor = map.locate(4).unwrap();
        assert_eq!(anchor, Anchor { node: 1, offset: 1 });
        assert_eq!(map.locate(6), Some(Anchor { node: 1, offset: 3 }));
        assert_eq!(map.locate(7), None);
    }

    #[test]
    fn bounding_box_collects_characters_by_center() {
        let doc = doc();
        let flattened = flatten_text(&doc);
        // Line 0 covers y 0..20; characters are 10px wide. Columns 5..=13
        // hold "NAME_HERE".
        let area = Rect::new(52.0, 2.0, 86.0, 16.0);
        let hit = resolve_bounding_box_to_offsets(&area, &doc, &flattened).unwrap();
        assert_eq!(hit, BoxSelection { start: 5, end: 14, text: "NAME_HERE".into() });
    }

    #[test]
    fn bounding_box_spanning_lines_takes_min_and_max() {
        let doc = doc();
        let flattened = flatten_text(&doc);
        // From "," on line 0 down to "Total" on line 1.
        let area = Rect::new(0.0, 0.0, 150.0, 40.0);
        let hit = resolve_bounding_box_to_offsets(&area, &doc, &flattened).unwrap();
        assert_eq!(hit.start, 0);
        assert_eq!(hit.end, flattened.len());
    }

    #[test]
    fn bounding_box_missing_every_center_is_none() {
        let doc = doc();
        let flattened = flatten_text(&doc);
        let area = Rect::new(500.0, 500.0, 50.0, 50.0);
        assert_eq!(resolve_bounding_box_to_offsets(&area, &doc, &flattened), None);
    }

    #[test]
    fn rect_from_corners_normalizes() {
        let rect = Rect::from_corners(Point { x: 30.0, y: 5.0 }, Point { x: 10.0, y: 25.0 });
        assert_eq!(rect, Rect::new(10.0, 5.0, 20.0, 20.0));
        assert!(rect.contains(Point { x: 10.0, y: 25.0 }));
        assert!(!rect.contains(Point { x: 9.9, y: 10.0 }));
    }
}
