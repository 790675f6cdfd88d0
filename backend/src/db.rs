//! SQLite persistence for templates, data sessions and data rows.
//!
//! Every write either fully succeeds or leaves the previous state in place:
//! multi-statement writes run inside a transaction, and schemas are validated
//! before anything is written.

use actix_web::HttpResponse;
use chrono::{DateTime, Utc};
use common::field_store::{FieldStore, FieldStoreError};
use common::generator::{validate_document, DocumentError};
use common::model::data::{DataRow, DataSession};
use common::model::template::{Template, TemplateSummary};
use common::preview::PreviewDocument;
use common::selection::MAX_PLACEHOLDER_LEN;
use common::text::{slice_utf16, utf16_len};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// How long a connection waits for another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Document is {size} bytes; the limit is {limit} bytes")]
    QuotaExceeded { size: usize, limit: usize },

    #[error(transparent)]
    Schema(#[from] FieldStoreError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Invalid(String),
}

impl StorageError {
    /// Maps the error onto the HTTP response returned by the handlers.
    pub fn to_response(&self) -> HttpResponse {
        let body = self.to_string();
        match self {
            StorageError::NotFound(_) => HttpResponse::NotFound().body(body),
            StorageError::QuotaExceeded { .. } => HttpResponse::PayloadTooLarge().body(body),
            StorageError::Schema(FieldStoreError::Overlap { .. }) => HttpResponse::Conflict().body(body),
            StorageError::Schema(FieldStoreError::NotFound(_)) => HttpResponse::NotFound().body(body),
            StorageError::Schema(_) | StorageError::Document(_) | StorageError::Invalid(_) => {
                HttpResponse::BadRequest().body(body)
            }
            StorageError::Sqlite(_) | StorageError::Json(_) => HttpResponse::ServiceUnavailable().body(body),
            StorageError::Io(_) => HttpResponse::InternalServerError().body(body),
        }
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS templates (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    document    BLOB NOT NULL,
    schema_json TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS data_sessions (
    id          TEXT PRIMARY KEY,
    template_id TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS data_rows (
    id          TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL,
    template_id TEXT NOT NULL,
    position    INTEGER NOT NULL,
    row_values  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_data_rows_session ON data_rows (session_id, position);
";

/// Opens the database file and makes sure the tables exist.
pub fn open(path: &Path) -> Result<Connection, StorageError> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Rejects documents above `limit`; warns once past 80 % of it.
pub fn check_document_size(size: usize, limit: usize) -> Result<(), StorageError> {
    if size > limit {
        return Err(StorageError::QuotaExceeded { size, limit });
    }
    if size.saturating_mul(5) > limit.saturating_mul(4) {
        warn!("Document of {} bytes is above 80% of the {} byte limit", size, limit);
    }
    Ok(())
}

/// Flattened text of a stored document, the offset space of its fields.
pub fn document_text(document: &[u8]) -> Result<String, StorageError> {
    Ok(PreviewDocument::from_docx(document)?.flattened_text())
}

/// The placeholder must be exactly the document text at `[start, end)`.
pub fn check_anchor(flattened: &str, placeholder: &str, start: usize, end: usize) -> Result<(), StorageError> {
    if utf16_len(placeholder) > MAX_PLACEHOLDER_LEN {
        return Err(StorageError::Invalid(format!(
            "Placeholder is longer than {} characters",
            MAX_PLACEHOLDER_LEN
        )));
    }
    match slice_utf16(flattened, start, end) {
        Some(text) if text == placeholder => Ok(()),
        _ => Err(StorageError::Invalid(format!(
            "Placeholder does not match the document text at [{}, {})",
            start, end
        ))),
    }
}

fn check_anchors(document: &[u8], schema: &FieldStore) -> Result<(), StorageError> {
    if schema.is_empty() {
        return Ok(());
    }
    let flattened = document_text(document)?;
    schema
        .iter()
        .try_for_each(|f| check_anchor(&flattened, &f.placeholder, f.start_position, f.end_position))
}

/// Inserts a template, or updates name and schema of an existing one. The
/// stored document of an existing template is never replaced; a new one must
/// be a valid `.docx` within `limit`. Every field must be anchored in the
/// document that ends up stored.
pub fn save_template(conn: &mut Connection, template: &Template, limit: usize) -> Result<(), StorageError> {
    if template.id.trim().is_empty() {
        return Err(StorageError::Invalid("Template id must not be empty".into()));
    }
    template.schema.validate()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let stored: Option<Vec<u8>> = tx
        .query_row(
            "SELECT document FROM templates WHERE id = ?1",
            params![&template.id],
            |row| row.get(0),
        )
        .optional()?;
    let document = match &stored {
        Some(document) => document.as_slice(),
        None => {
            check_document_size(template.original_document.len(), limit)?;
            validate_document(&template.original_document)?;
            template.original_document.as_slice()
        }
    };
    check_anchors(document, &template.schema)?;

    let schema_json = serde_json::to_string(&template.schema)?;
    tx.execute(
        "INSERT INTO templates (id, name, document, schema_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, schema_json = excluded.schema_json",
        params![
            &template.id,
            &template.name,
            &template.original_document,
            &schema_json,
            &template.created_at
        ],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn load_template(conn: &Connection, template_id: &str) -> Result<Template, StorageError> {
    let row = conn
        .query_row(
            "SELECT id, name, document, schema_json, created_at FROM templates WHERE id = ?1",
            params![template_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, DateTime<Utc>>(4)?,
                ))
            },
        )
        .optional()?;

    let (id, name, original_document, schema_json, created_at) =
        row.ok_or_else(|| StorageError::NotFound(format!("Template {}", template_id)))?;
    let schema: FieldStore = serde_json::from_str(&schema_json)?;

    Ok(Template {
        id,
        name,
        original_document,
        schema,
        created_at,
    })
}

pub fn list_templates(conn: &Connection) -> Result<Vec<TemplateSummary>, StorageError> {
    let mut stmt = conn.prepare("SELECT id, name, schema_json, created_at FROM templates ORDER BY created_at DESC")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, DateTime<Utc>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, name, schema_json, created_at)| {
            let schema: FieldStore = serde_json::from_str(&schema_json)?;
            Ok(TemplateSummary {
                id,
                name,
                field_count: schema.len(),
                created_at,
            })
        })
        .collect()
}

/// Replaces the schema of a stored template after validating it.
pub fn update_schema(conn: &Connection, template_id: &str, schema: &FieldStore) -> Result<(), StorageError> {
    schema.validate()?;
    let changed = conn.execute(
        "UPDATE templates SET schema_json = ?1 WHERE id = ?2",
        params![serde_json::to_string(schema)?, template_id],
    )?;
    if changed == 0 {
        return Err(StorageError::NotFound(format!("Template {}", template_id)));
    }
    Ok(())
}

/// Deletes a template together with its session and rows.
pub fn delete_template(conn: &mut Connection, template_id: &str) -> Result<(), StorageError> {
    let tx = conn.transaction()?;
    let rows = tx.execute("DELETE FROM data_rows WHERE template_id = ?1", params![template_id])?;
    tx.execute("DELETE FROM data_sessions WHERE template_id = ?1", params![template_id])?;
    let templates = tx.execute("DELETE FROM templates WHERE id = ?1", params![template_id])?;
    if templates == 0 {
        return Err(StorageError::NotFound(format!("Template {}", template_id)));
    }
    tx.commit()?;
    info!("Deleted template {} and {} data row(s)", template_id, rows);
    Ok(())
}

fn session_from_row(row: &rusqlite::Row) -> rusqlite::Result<DataSession> {
    Ok(DataSession {
        id: row.get(0)?,
        template_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

pub fn load_session(conn: &Connection, session_id: &str) -> Result<DataSession, StorageError> {
    conn.query_row(
        "SELECT id, template_id, name, created_at, updated_at FROM data_sessions WHERE id = ?1",
        params![session_id],
        session_from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::NotFound(format!("Session {}", session_id)))
}

/// Returns the template's session, creating it on first use.
pub fn open_session(conn: &Connection, template_id: &str, now: DateTime<Utc>) -> Result<DataSession, StorageError> {
    let existing = conn
        .query_row(
            "SELECT id, template_id, name, created_at, updated_at FROM data_sessions WHERE template_id = ?1",
            params![template_id],
            session_from_row,
        )
        .optional()?;
    if let Some(session) = existing {
        return Ok(session);
    }

    let template = load_template(conn, template_id)?;
    let session = DataSession::new(template_id, &template.name, now);
    conn.execute(
        "INSERT INTO data_sessions (id, template_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            &session.id,
            &session.template_id,
            &session.name,
            &session.created_at,
            &session.updated_at
        ],
    )?;
    info!("Created session {} for template {}", session.id, template_id);
    Ok(session)
}

pub fn rename_session(
    conn: &Connection,
    session_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<DataSession, StorageError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::Invalid("Session name must not be empty".into()));
    }
    let mut session = load_session(conn, session_id)?;
    session.rename(name, now);
    conn.execute(
        "UPDATE data_sessions SET name = ?1, updated_at = ?2 WHERE id = ?3",
        params![&session.name, &session.updated_at, session_id],
    )?;
    Ok(session)
}

pub fn load_rows(conn: &Connection, session_id: &str) -> Result<Vec<DataRow>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, template_id, session_id, row_values FROM data_rows WHERE session_id = ?1 ORDER BY position",
    )?;
    let raw = stmt
        .query_map(params![session_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(id, template_id, session_id, values)| {
            let values: HashMap<String, String> = serde_json::from_str(&values)?;
            Ok(DataRow {
                id,
                template_id,
                session_id,
                values,
            })
        })
        .collect()
}

fn insert_rows(
    tx: &rusqlite::Transaction,
    session: &DataSession,
    rows: &[DataRow],
    first_position: i64,
) -> Result<(), StorageError> {
    let mut stmt = tx.prepare(
        "INSERT INTO data_rows (id, session_id, template_id, position, row_values) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (i, row) in rows.iter().enumerate() {
        if row.session_id != session.id || row.template_id != session.template_id {
            return Err(StorageError::Invalid(format!(
                "Row {} does not belong to session {}",
                row.id, session.id
            )));
        }
        stmt.execute(params![
            &row.id,
            &session.id,
            &session.template_id,
            first_position + i as i64,
            serde_json::to_string(&row.values)?
        ])?;
    }
    Ok(())
}

/// Replaces every row of a session in one transaction, keeping input order.
pub fn replace_rows(
    conn: &mut Connection,
    session_id: &str,
    rows: &[DataRow],
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let session = load_session(conn, session_id)?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM data_rows WHERE session_id = ?1", params![session_id])?;
    insert_rows(&tx, &session, rows, 0)?;
    tx.execute(
        "UPDATE data_sessions SET updated_at = ?1 WHERE id = ?2",
        params![&now, session_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Appends rows after the existing ones in one transaction.
pub fn append_rows(
    conn: &mut Connection,
    session_id: &str,
    rows: &[DataRow],
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let session = load_session(conn, session_id)?;
    let tx = conn.transaction()?;
    let next: i64 = tx.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM data_rows WHERE session_id = ?1",
        params![session_id],
        |row| row.get(0),
    )?;
    insert_rows(&tx, &session, rows, next)?;
    tx.execute(
        "UPDATE data_sessions SET updated_at = ?1 WHERE id = ?2",
        params![&now, session_id],
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::model::field::{FieldDraft, FieldType};
    use common::testing::{docx_with_body, paragraph};
    use pretty_assertions::assert_eq;

    pub(crate) fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    pub(crate) const TEST_LIMIT: usize = 1024 * 1024;

    pub(crate) fn stored_template(conn: &mut Connection) -> Template {
        let body = paragraph(&["Dear ", "NAME_HERE", ", you owe ", "0.00"]);
        let template = Template::new("Invoice", docx_with_body(&body));
        save_template(conn, &template, TEST_LIMIT).unwrap();
        template
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn template_round_trips() {
        let mut conn = memory_db();
        let mut template = stored_template(&mut conn);
        template
            .schema
            .add(FieldDraft {
                name: "Name".into(),
                placeholder: "NAME_HERE".into(),
                field_type: FieldType::Text,
                start_position: 5,
                end_position: 14,
            })
            .unwrap();
        update_schema(&conn, &template.id, &template.schema).unwrap();

        let loaded = load_template(&conn, &template.id).unwrap();
        assert_eq!(loaded.schema, template.schema);
        assert_eq!(loaded.original_document, template.original_document);

        let listed = list_templates(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].field_count, 1);
    }

    #[test]
    fn saving_keeps_original_document() {
        let mut conn = memory_db();
        let mut template = stored_template(&mut conn);
        let original = template.original_document.clone();
        template.name = "Renamed".into();
        template.original_document = b"something else".to_vec();
        save_template(&mut conn, &template, TEST_LIMIT).unwrap();

        let loaded = load_template(&conn, &template.id).unwrap();
        assert_eq!(loaded.name, "Renamed");
        assert_eq!(loaded.original_document, original);
    }

    #[test]
    fn oversized_document_is_rejected_without_writing() {
        let mut conn = memory_db();
        let template = Template::new("Big", vec![0u8; 2048]);
        let err = save_template(&mut conn, &template, 1024).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { size: 2048, limit: 1024 }));
        assert_eq!(err.to_response().status(), actix_web::http::StatusCode::PAYLOAD_TOO_LARGE);
        assert!(list_templates(&conn).unwrap().is_empty());
    }

    #[test]
    fn size_warning_threshold_handles_huge_limits() {
        assert!(check_document_size(10, usize::MAX).is_ok());
        assert!(check_document_size(usize::MAX - 1, usize::MAX).is_ok());
        assert!(check_document_size(usize::MAX, usize::MAX - 1).is_err());
    }

    #[test]
    fn new_template_must_be_a_docx() {
        let mut conn = memory_db();
        let junk = Template::new("Junk", b"definitely not a zip".to_vec());
        let err = save_template(&mut conn, &junk, TEST_LIMIT).unwrap_err();
        assert!(matches!(err, StorageError::Document(_)));
        assert_eq!(err.to_response().status(), actix_web::http::StatusCode::BAD_REQUEST);
        assert!(list_templates(&conn).unwrap().is_empty());
    }

    #[test]
    fn saved_fields_must_match_document_text() {
        let mut conn = memory_db();
        let body = paragraph(&["Dear ", "NAME_HERE", ", you owe ", "0.00"]);
        let mut template = Template::new("Invoice", docx_with_body(&body));
        template
            .schema
            .add(FieldDraft {
                name: "Name".into(),
                placeholder: "SOMEONE".into(),
                field_type: FieldType::Text,
                start_position: 5,
                end_position: 12,
            })
            .unwrap();
        let err = save_template(&mut conn, &template, TEST_LIMIT).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
        assert!(list_templates(&conn).unwrap().is_empty());

        let mut template = Template::new("Invoice", docx_with_body(&body));
        template
            .schema
            .add(FieldDraft {
                name: "Name".into(),
                placeholder: "NAME_HERE".into(),
                field_type: FieldType::Text,
                start_position: 5,
                end_position: 14,
            })
            .unwrap();
        save_template(&mut conn, &template, TEST_LIMIT).unwrap();
        assert_eq!(load_template(&conn, &template.id).unwrap().schema, template.schema);
    }

    #[test]
    fn missing_template_is_not_found() {
        let conn = memory_db();
        let err = load_template(&conn, "template_missing").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(err.to_response().status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn session_is_created_once_and_renamed() {
        let mut conn = memory_db();
        let template = stored_template(&mut conn);

        let first = open_session(&conn, &template.id, now()).unwrap();
        assert_eq!(first.name, "Invoice - Mar 7, 2026");
        let again = open_session(&conn, &template.id, now()).unwrap();
        assert_eq!(again.id, first.id);

        let later = Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap();
        let renamed = rename_session(&conn, &first.id, "  March batch ", later).unwrap();
        assert_eq!(renamed.name, "March batch");
        assert_eq!(load_session(&conn, &first.id).unwrap().updated_at, later);
        assert!(matches!(
            rename_session(&conn, &first.id, " ", later),
            Err(StorageError::Invalid(_))
        ));
    }

    #[test]
    fn rows_keep_order_and_replace_atomically() {
        let mut conn = memory_db();
        let template = stored_template(&mut conn);
        let session = open_session(&conn, &template.id, now()).unwrap();

        let make = |v: &str| {
            let mut values = HashMap::new();
            values.insert("field_a".to_string(), v.to_string());
            DataRow::new(template.id.clone(), session.id.clone(), values)
        };
        let rows = vec![make("c"), make("a"), make("b")];
        replace_rows(&mut conn, &session.id, &rows, now()).unwrap();
        append_rows(&mut conn, &session.id, &[make("d")], now()).unwrap();

        let loaded = load_rows(&conn, &session.id).unwrap();
        let values: Vec<&str> = loaded.iter().map(|r| r.value_for("field_a")).collect();
        assert_eq!(values, vec!["c", "a", "b", "d"]);

        let mut foreign = make("x");
        foreign.session_id = "session_other".into();
        let err = replace_rows(&mut conn, &session.id, &[make("y"), foreign], now()).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
        assert_eq!(load_rows(&conn, &session.id).unwrap().len(), 4);
    }

    #[test]
    fn deleting_template_removes_session_and_rows() {
        let mut conn = memory_db();
        let template = stored_template(&mut conn);
        let session = open_session(&conn, &template.id, now()).unwrap();
        let row = DataRow::new(template.id.clone(), session.id.clone(), HashMap::new());
        replace_rows(&mut conn, &session.id, &[row], now()).unwrap();

        delete_template(&mut conn, &template.id).unwrap();
        assert!(matches!(load_session(&conn, &session.id), Err(StorageError::NotFound(_))));
        assert!(load_rows(&conn, &session.id).unwrap().is_empty());
        assert!(matches!(
            delete_template(&mut conn, &template.id),
            Err(StorageError::NotFound(_))
        ));
    }
}
