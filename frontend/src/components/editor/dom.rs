//! Live DOM view of the rendered template.
//!
//! The text leaves are the DOM text nodes under the document root, in tree
//! order. Coordinates are local to the root's bounding box, the same space
//! the pointer handlers report in.

use common::position_map::{Anchor, Point, PositionMap, Rect, RenderedDocument, SelectionRange};
use web_sys::{Element, MouseEvent, Node};

/// `NodeFilter.SHOW_TEXT`.
const SHOW_TEXT: u32 = 0x4;

pub struct DomDocument {
    root: Element,
}

impl DomDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Pointer position relative to the document root.
    pub fn local_point(&self, e: &MouseEvent) -> Point {
        let bounds = self.root.get_bounding_client_rect();
        Point {
            x: e.client_x() as f64 - bounds.left(),
            y: e.client_y() as f64 - bounds.top(),
        }
    }

    fn text_nodes_under(&self, node: &Node) -> Vec<Node> {
        let Some(document) = self.root.owner_document() else {
            return Vec::new();
        };
        let Ok(walker) = document.create_tree_walker_with_what_to_show(node, SHOW_TEXT) else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        while let Ok(Some(next)) = walker.next_node() {
            nodes.push(next);
        }
        nodes
    }

    /// Moves a boundary point that sits between elements onto a text node.
    fn text_anchor(&self, container: &Node, offset: usize) -> Option<Anchor<Node>> {
        if container.node_type() == Node::TEXT_NODE {
            return Some(Anchor {
                node: container.clone(),
                offset,
            });
        }
        let children = container.child_nodes();
        if let Some(child) = children.item(offset as u32) {
            if child.node_type() == Node::TEXT_NODE {
                return Some(Anchor { node: child, offset: 0 });
            }
            if let Some(first) = self.text_nodes_under(&child).into_iter().next() {
                return Some(Anchor { node: first, offset: 0 });
            }
        }
        let last = self.text_nodes_under(container).pop()?;
        let len = self.leaf_text(&last).encode_utf16().count();
        Some(Anchor { node: last, offset: len })
    }

    /// The browser's current selection, if it touches this document.
    pub fn native_selection(&self) -> Option<SelectionRange<Node>> {
        let selection = web_sys::window()?.get_selection().ok()??;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        let start_container = range.start_container().ok()?;
        let end_container = range.end_container().ok()?;
        if !self.root.contains(Some(&start_container)) && !self.root.contains(Some(&end_container)) {
            return None;
        }
        Some(SelectionRange {
            start: self.text_anchor(&start_container, range.start_offset().ok()? as usize)?,
            end: self.text_anchor(&end_container, range.end_offset().ok()? as usize)?,
        })
    }

    /// Scrolls the run holding the flattened-text `offset` into view.
    pub fn reveal_offset(&self, offset: usize) {
        let Some(anchor) = PositionMap::build(self).locate(offset) else {
            return;
        };
        if let Some(element) = anchor.node.parent_element() {
            element.scroll_into_view();
        }
    }
}

/// Drops the browser's selection, e.g. once it became a field.
pub fn clear_native_selection() {
    if let Some(Ok(Some(selection))) = web_sys::window().map(|w| w.get_selection()) {
        let _ = selection.remove_all_ranges();
    }
}

impl RenderedDocument for DomDocument {
    type Node = Node;

    fn text_leaves(&self) -> Vec<Node> {
        self.text_nodes_under(&self.root)
    }

    fn leaf_text(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn char_rect(&self, node: &Node, start: usize, end: usize) -> Option<Rect> {
        let range = self.root.owner_document()?.create_range().ok()?;
        range.set_start(node, start as u32).ok()?;
        range.set_end(node, end as u32).ok()?;
        let rect = range.get_bounding_client_rect();
        if rect.width() == 0.0 && rect.height() == 0.0 {
            return None;
        }
        let origin = self.root.get_bounding_client_rect();
        Some(Rect::new(
            rect.left() - origin.left(),
            rect.top() - origin.top(),
            rect.width(),
            rect.height(),
        ))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use common::position_map::{flatten_text, PositionMap};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mounted(html: &str) -> Element {
        let document = web_sys::window().unwrap().document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(html);
        document.body().unwrap().append_child(&root).unwrap();
        root
    }

    #[wasm_bindgen_test]
    fn text_nodes_flatten_in_tree_order() {
        let root = mounted("<p><span>Dear </span><span>NAME_HERE</span></p><p><span>, bye</span></p>");
        let dom = DomDocument::new(root.clone());
        assert_eq!(flatten_text(&dom), "Dear NAME_HERE, bye");

        let map = PositionMap::build(&dom);
        let anchor = map.locate(7).unwrap();
        assert_eq!(anchor.offset, 2);
        assert_eq!(dom.leaf_text(&anchor.node), "NAME_HERE");
        root.remove();
    }

    #[wasm_bindgen_test]
    fn native_selection_resolves_to_flattened_offsets() {
        let root = mounted("<p><span>Dear </span><span>NAME_HERE</span></p>");
        let dom = DomDocument::new(root.clone());
        let leaves = dom.text_leaves();

        let document = web_sys::window().unwrap().document().unwrap();
        let range = document.create_range().unwrap();
        range.set_start(&leaves[0], 3).unwrap();
        range.set_end(&leaves[1], 4).unwrap();
        let selection = web_sys::window().unwrap().get_selection().unwrap().unwrap();
        selection.remove_all_ranges().unwrap();
        selection.add_range(&range).unwrap();

        let native = dom.native_selection().unwrap();
        let offsets = PositionMap::build(&dom).resolve(&native).unwrap();
        assert_eq!((offsets.start, offsets.end), (3, 9));

        clear_native_selection();
        assert!(dom.native_selection().is_none());
        root.remove();
    }
}
