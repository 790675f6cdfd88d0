//! Placeholder substitution inside `.docx` archives.
//!
//! The main content part is treated as opaque text: every literal occurrence
//! of a field's placeholder is replaced with the row's XML-escaped value.
//! A placeholder that the source document split across several runs does not
//! appear literally in the markup and is left untouched.

use crate::field_store::FieldStore;
use crate::ids::generate_id;
use crate::model::data::DataRow;
use crate::model::generated::GeneratedDocument;
use crate::model::template::Template;
use chrono::Utc;
use log::{debug, info};
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Path of the main content part inside a word-processing archive.
pub const CONTENT_PART: &str = "word/document.xml";

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const ZIP_MIME: &str = "application/zip";

/// Longest file stem used for an entry of a bundle.
pub const MAX_ENTRY_STEM_LEN: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid .docx file: missing document.xml")]
    InvalidDocument,

    #[error("Invalid .docx archive: {0}")]
    Archive(#[from] ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document.xml is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("document.xml is not well-formed: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Failed to generate document for row {row}: {source}")]
    RowFailed {
        row: usize,
        #[source]
        source: Box<DocumentError>,
    },
}

/// Escapes the five XML special characters.
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Replaces every literal occurrence of `placeholder` with `replacement`.
/// Returns the new text and the number of replacements made.
pub fn replace_placeholder(xml: &str, placeholder: &str, replacement: &str) -> (String, usize) {
    if placeholder.is_empty() {
        return (xml.to_string(), 0);
    }
    let count = xml.matches(placeholder).count();
    if count == 0 {
        return (xml.to_string(), 0);
    }
    (xml.split(placeholder).collect::<Vec<_>>().join(replacement), count)
}

/// Applies every field of `schema`, in schema order, to `xml`.
pub fn substitute_fields(xml: &str, schema: &FieldStore, row: &DataRow) -> String {
    let mut content = xml.to_string();
    for field in schema {
        let value = escape_xml(row.value_for(&field.id));
        let (next, count) = replace_placeholder(&content, &field.placeholder, &value);
        if count == 0 {
            debug!("Placeholder for field '{}' not found in content", field.name);
        } else {
            debug!("Replaced {} occurrence(s) of field '{}'", count, field.name);
        }
        content = next;
    }
    content
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, DocumentError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, DocumentError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Err(DocumentError::InvalidDocument),
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// Reads the main content part of a `.docx`.
pub fn read_content_part(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = open_archive(bytes)?;
    read_part(&mut archive, CONTENT_PART)
}

/// Accepts a well-formed zip archive that contains `word/document.xml`.
pub fn validate_document(bytes: &[u8]) -> Result<(), DocumentError> {
    let mut archive = open_archive(bytes)?;
    match archive.by_name(CONTENT_PART) {
        Ok(_) => Ok(()),
        Err(ZipError::FileNotFound) => Err(DocumentError::InvalidDocument),
        Err(e) => Err(e.into()),
    }
}

/// Produces the document for one data row.
///
/// Every entry of the original archive is copied in order; only the content
/// part is rewritten.
pub fn generate_document(template: &Template, row: &DataRow) -> Result<Vec<u8>, DocumentError> {
    let mut archive = open_archive(&template.original_document)?;
    let content = read_part(&mut archive, CONTENT_PART)?;
    let content = substitute_fields(&content, &template.schema, row);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();
        if file.is_dir() {
            writer.add_directory(name, options)?;
        } else if name == CONTENT_PART {
            writer.start_file(name, options)?;
            writer.write_all(content.as_bytes())?;
        } else {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            writer.start_file(name, options)?;
            writer.write_all(&buf)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

/// [`generate_document`] wrapped with the ids of its inputs.
pub fn generate_row_document(template: &Template, row: &DataRow) -> Result<GeneratedDocument, DocumentError> {
    Ok(GeneratedDocument {
        id: generate_id("doc"),
        template_id: template.id.clone(),
        data_row_id: row.id.clone(),
        document: generate_document(template, row)?,
        created_at: Utc::now(),
    })
}

/// Generates one document per row, in row order.
///
/// `on_progress(completed, total)` runs after each row. The first failing row
/// aborts the batch and nothing produced so far is returned.
pub fn generate_all_documents<F>(
    template: &Template,
    rows: &[DataRow],
    mut on_progress: F,
) -> Result<Vec<GeneratedDocument>, DocumentError>
where
    F: FnMut(usize, usize),
{
    let total = rows.len();
    info!(
        "Generating {} document(s) from template {} ({} fields)",
        total,
        template.id,
        template.schema.len()
    );

    let mut documents = Vec::with_capacity(total);
    for (index, row) in rows.iter().enumerate() {
        let document = generate_row_document(template, row).map_err(|e| DocumentError::RowFailed {
            row: index + 1,
            source: Box::new(e),
        })?;
        documents.push(document);
        on_progress(index + 1, total);
    }

    info!("Generated {} document(s) from template {}", total, template.id);
    Ok(documents)
}

/// File stem for the document generated from `row`: the row's value for the
/// first schema field, with anything outside `[A-Za-z0-9_-]` replaced by `_`
/// and cut to fifty characters. Falls back to `document_{index + 1}`.
pub fn document_file_stem(template: &Template, row: Option<&DataRow>, index: usize) -> String {
    let value = template
        .schema
        .first()
        .and_then(|field| row.map(|r| r.value_for(&field.id)))
        .unwrap_or("");
    let source = if value.is_empty() {
        format!("document_{}", index + 1)
    } else {
        value.to_string()
    };
    source
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_ENTRY_STEM_LEN)
        .collect()
}

pub fn document_file_name(template: &Template, row: Option<&DataRow>, index: usize) -> String {
    format!("{}.docx", document_file_stem(template, row, index))
}

/// `"{template name}_documents.zip"`.
pub fn bundle_file_name(template: &Template) -> String {
    format!("{}_documents.zip", template.name)
}

/// Packs generated documents into one zip, one entry per document, in order.
///
/// Entry names come from [`document_file_name`]; a name already used in the
/// bundle gets a `_2`, `_3`, ... suffix.
pub fn bundle_documents(
    documents: &[GeneratedDocument],
    template: &Template,
    rows: &[DataRow],
) -> Result<Vec<u8>, DocumentError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used = HashSet::new();

    for (index, doc) in documents.iter().enumerate() {
        let row = rows.iter().find(|r| r.id == doc.data_row_id);
        let stem = document_file_stem(template, row, index);
        let mut name = format!("{}.docx", stem);
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{}_{}.docx", stem, n);
            n += 1;
        }
        writer.start_file(name, options)?;
        writer.write_all(&doc.document)?;
    }

    Ok(writer.finish()?.into_inner())
}
