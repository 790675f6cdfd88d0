//! Fixtures shared by unit tests here and by the backend's tests.

use crate::position_map::{Rect, RenderedDocument};
use crate::text::utf16_len;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CHAR_WIDTH: f64 = 10.0;
pub const LINE_HEIGHT: f64 = 20.0;

/// Rendered document with a fixed monospace layout: every UTF-16 unit is
/// `CHAR_WIDTH` wide, line `i` spans `y = i * LINE_HEIGHT ..`, and leaves
/// within a line follow each other without gaps. Nodes are leaf indices.
#[derive(Debug, Clone)]
pub struct MonospaceDocument {
    leaves: Vec<Leaf>,
}

#[derive(Debug, Clone)]
struct Leaf {
    text: String,
    line: usize,
    column: usize,
}

impl MonospaceDocument {
    pub fn new(lines: &[&[&str]]) -> Self {
        let mut leaves = Vec::new();
        for (line, runs) in lines.iter().enumerate() {
            let mut column = 0;
            for run in runs.iter() {
                leaves.push(Leaf {
                    text: run.to_string(),
                    line,
                    column,
                });
                column += utf16_len(run);
            }
        }
        Self { leaves }
    }
}

impl RenderedDocument for MonospaceDocument {
    type Node = usize;

    fn text_leaves(&self) -> Vec<usize> {
        (0..self.leaves.len()).collect()
    }

    fn leaf_text(&self, node: &usize) -> String {
        self.leaves.get(*node).map(|leaf| leaf.text.clone()).unwrap_or_default()
    }

    fn char_rect(&self, node: &usize, start: usize, end: usize) -> Option<Rect> {
        let leaf = self.leaves.get(*node)?;
        Some(Rect::new(
            (leaf.column + start) as f64 * CHAR_WIDTH,
            leaf.line as f64 * LINE_HEIGHT,
            (end - start) as f64 * CHAR_WIDTH,
            LINE_HEIGHT,
        ))
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Wraps body markup into a complete `word/document.xml`.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

/// One `<w:p>` with one `<w:r><w:t>` per run.
pub fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|text| format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// Minimal valid `.docx` whose body is `body`.
pub fn docx_with_body(body: &str) -> Vec<u8> {
    let document = document_xml(body);
    docx_with_parts(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", document.as_str()),
    ])
}

/// Zip archive holding exactly the given parts, in order.
pub fn docx_with_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(content.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}
