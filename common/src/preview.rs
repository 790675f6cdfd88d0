//! Lightweight read-only rendering model of a `.docx` body.
//!
//! Only what the editor needs to show text and map offsets is kept:
//! paragraphs, and inside them the text runs with basic emphasis. Each
//! non-empty run becomes one text leaf, so the flattened text of the preview
//! is the concatenation of all run texts.

use crate::generator::{DocumentError, read_content_part};
use crate::position_map::{Rect, RenderedDocument, flatten_text};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewParagraph {
    /// `w:pStyle` value, e.g. `Heading1`.
    pub style: Option<String>,
    pub runs: Vec<PreviewRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewDocument {
    pub paragraphs: Vec<PreviewParagraph>,
}

/// Handle to one run of a [`PreviewDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunRef {
    pub paragraph: usize,
    pub run: usize,
}

impl PreviewDocument {
    /// Opens a `.docx` archive and renders its main content part.
    pub fn from_docx(bytes: &[u8]) -> Result<Self, DocumentError> {
        let xml = read_content_part(bytes)?;
        Self::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> Result<Self, DocumentError> {
        let doc = Document::parse(xml)?;
        let paragraphs = doc
            .descendants()
            .filter(|n| n.has_tag_name((W_NS, "p")))
            .map(render_paragraph)
            .collect();
        Ok(Self { paragraphs })
    }

    pub fn run(&self, at: RunRef) -> Option<&PreviewRun> {
        self.paragraphs.get(at.paragraph)?.runs.get(at.run)
    }

    pub fn flattened_text(&self) -> String {
        flatten_text(self)
    }
}

impl RenderedDocument for PreviewDocument {
    type Node = RunRef;

    fn text_leaves(&self) -> Vec<RunRef> {
        self.paragraphs
            .iter()
            .enumerate()
            .flat_map(|(paragraph, p)| (0..p.runs.len()).map(move |run| RunRef { paragraph, run }))
            .collect()
    }

    fn leaf_text(&self, node: &RunRef) -> String {
        self.run(*node).map(|r| r.text.clone()).unwrap_or_default()
    }

    fn char_rect(&self, _node: &RunRef, _start: usize, _end: usize) -> Option<Rect> {
        None
    }
}

fn w_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name((W_NS, name)))
}

/// Toggle properties such as `<w:b/>` are on unless `w:val` says otherwise.
fn toggle_on(props: Option<Node>, name: &str) -> bool {
    props
        .and_then(|p| w_child(p, name))
        .is_some_and(|n| !matches!(n.attribute((W_NS, "val")), Some("0" | "false" | "none")))
}

/// Nearest enclosing `w:p`, which for nested text boxes is the inner one.
fn owning_paragraph<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.ancestors().skip(1).find(|a| a.has_tag_name((W_NS, "p")))
}

fn render_paragraph(p: Node) -> PreviewParagraph {
    let style = w_child(p, "pPr")
        .and_then(|ppr| w_child(ppr, "pStyle"))
        .and_then(|s| s.attribute((W_NS, "val")))
        .map(str::to_string);

    let runs = p
        .descendants()
        .filter(|n| n.has_tag_name((W_NS, "r")) && owning_paragraph(*n) == Some(p))
        .filter_map(render_run)
        .collect();

    PreviewParagraph { style, runs }
}

fn render_run(r: Node) -> Option<PreviewRun> {
    let mut text = String::new();
    for child in r.children().filter(|c| c.is_element() && c.tag_name().namespace() == Some(W_NS)) {
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or("")),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    if text.is_empty() {
        return None;
    }

    let props = w_child(r, "rPr");
    Some(PreviewRun {
        text,
        bold: toggle_on(props, "b"),
        italic: toggle_on(props, "i"),
        underline: toggle_on(props, "u"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position_map::build_position_map;
    use crate::testing::{docx_with_body, docx_with_parts, paragraph};
    use pretty_assertions::assert_eq;

    #[test]
    fn runs_become_leaves_in_order() {
        let body = [paragraph(&["Dear ", "NAME_HERE", ","]), paragraph(&["Total: 0.00"])].concat();
        let preview = PreviewDocument::from_docx(&docx_with_body(&body)).unwrap();

        assert_eq!(preview.paragraphs.len(), 2);
        assert_eq!(preview.paragraphs[0].runs.len(), 3);
        assert_eq!(preview.flattened_text(), "Dear NAME_HERE,Total: 0.00");

        let map = build_position_map(&preview);
        assert_eq!(map.entries()[1].node, RunRef { paragraph: 0, run: 1 });
        assert_eq!(map.entries()[1].start_offset, 5);
    }

    #[test]
    fn tabs_breaks_and_emphasis() {
        let body = concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#,
            r#"<w:r><w:rPr><w:b/><w:i w:val="0"/></w:rPr><w:t>Title</w:t><w:tab/><w:t>x</w:t></w:r>"#,
            r#"<w:r><w:br/></w:r>"#,
            r#"<w:r><w:rPr><w:u w:val="single"/></w:rPr><w:t></w:t></w:r>"#,
            r#"</w:p>"#
        );
        let preview = PreviewDocument::from_docx(&docx_with_body(body)).unwrap();
        let p = &preview.paragraphs[0];

        assert_eq!(p.style.as_deref(), Some("Heading1"));
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].text, "Title\tx");
        assert!(p.runs[0].bold);
        assert!(!p.runs[0].italic);
        assert_eq!(p.runs[1].text, "\n");
    }

    #[test]
    fn table_cells_are_separate_paragraphs() {
        let body = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            paragraph(&["A1"]),
            paragraph(&["B1"])
        );
        let preview = PreviewDocument::from_docx(&docx_with_body(&body)).unwrap();
        assert_eq!(preview.paragraphs.len(), 2);
        assert_eq!(preview.flattened_text(), "A1B1");
    }

    #[test]
    fn archive_without_content_part_is_rejected() {
        let bytes = docx_with_parts(&[("word/styles.xml", "<x/>")]);
        assert!(matches!(
            PreviewDocument::from_docx(&bytes),
            Err(DocumentError::InvalidDocument)
        ));
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(matches!(
            PreviewDocument::from_xml("<w:document><w:body>"),
            Err(DocumentError::Xml(_))
        ));
    }
}
