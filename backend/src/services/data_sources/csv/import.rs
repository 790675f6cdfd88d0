use crate::config::AppConfig;
use crate::db::{self, StorageError};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use common::import::{detect_delimiter, matched_fields, normalize_cell, rows_from_records};
use common::requests::CsvImportResult;
use futures_util::StreamExt;
use log::info;
use rusqlite::Connection;

/// Parsed CSV: trimmed headers and the non-blank records.
#[derive(Debug, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

/// HTTP handler wrapper that converts the import result into a response.
pub async fn process(
    config: web::Data<AppConfig>,
    session_id: web::Path<String>,
    payload: Multipart,
) -> impl Responder {
    let bytes = match read_csv_part(payload, config.max_document_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => return e.to_response(),
    };
    let result = parse_csv(&bytes).and_then(|table| {
        let mut conn = db::open(&config.database)?;
        import_table(&mut conn, &session_id, &table)
    });
    match result {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => e.to_response(),
    }
}

async fn read_csv_part(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, StorageError> {
    let mut file: Option<Vec<u8>> = None;
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| StorageError::Invalid(e.to_string()))?;
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .is_some_and(|name| name == "file");
        if is_file {
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                .unwrap_or_default();
            if !filename.to_lowercase().ends_with(".csv") {
                return Err(StorageError::Invalid("The file must end with .csv".into()));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| StorageError::Invalid(e.to_string()))?;
            if is_file {
                if bytes.len() + chunk.len() > limit {
                    return Err(StorageError::QuotaExceeded {
                        size: bytes.len() + chunk.len(),
                        limit,
                    });
                }
                bytes.extend_from_slice(&chunk);
            }
        }
        if is_file {
            file = Some(bytes);
        }
    }
    file.ok_or_else(|| StorageError::Invalid("Missing file part".into()))
}

/// Parses CSV bytes, detecting the delimiter from the first non-blank line.
pub fn parse_csv(bytes: &[u8]) -> Result<CsvTable, StorageError> {
    let text = std::str::from_utf8(bytes).map_err(|_| StorageError::Invalid("CSV is not valid UTF-8".into()))?;
    let text = text.trim_start_matches('\u{feff}');
    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| StorageError::Invalid("CSV file is empty".into()))?;
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StorageError::Invalid(e.to_string()))?
        .iter()
        .map(normalize_cell)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(StorageError::Invalid("CSV header is empty".into()));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StorageError::Invalid(e.to_string()))?;
        let cells: Vec<String> = record.iter().map(normalize_cell).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        records.push(cells);
    }

    Ok(CsvTable { headers, records })
}

/// Appends one row per record to the session.
pub fn import_table(conn: &mut Connection, session_id: &str, table: &CsvTable) -> Result<CsvImportResult, StorageError> {
    let session = db::load_session(conn, session_id)?;
    let template = db::load_template(conn, &session.template_id)?;

    let rows = rows_from_records(
        &template.id,
        &session.id,
        &table.headers,
        &table.records,
        &template.schema,
    );
    db::append_rows(conn, &session.id, &rows, Utc::now())?;

    let result = CsvImportResult {
        imported: rows.len(),
        matched_fields: matched_fields(&table.headers, &template.schema),
    };
    info!(
        "Imported {} row(s) into session {} ({} matched field(s))",
        result.imported,
        session.id,
        result.matched_fields.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{memory_db, stored_template};
    use crate::services::templates::fields::add_field;
    use common::model::field::{FieldDraft, FieldType};
    use pretty_assertions::assert_eq;

    #[test]
    fn semicolon_csv_with_bom_and_blank_lines() {
        let csv = "\u{feff}Name ; Amount\n\nBob;42\n ; \nAlice;\"1;000\"\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Name", "Amount"]);
        assert_eq!(
            table.records,
            vec![vec!["Bob".to_string(), "42".to_string()], vec!["Alice".to_string(), "1;000".to_string()]]
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_csv(b"  \n"), Err(StorageError::Invalid(_))));
        assert!(matches!(parse_csv(&[0xff, 0xfe]), Err(StorageError::Invalid(_))));
    }

    #[test]
    fn import_matches_columns_to_fields() {
        let mut conn = memory_db();
        let template = stored_template(&mut conn);
        add_field(
            &mut conn,
            &template.id,
            FieldDraft {
                name: "Name".into(),
                placeholder: "NAME_HERE".into(),
                field_type: FieldType::Text,
                start_position: 5,
                end_position: 14,
            },
        )
        .unwrap();
        let session = db::open_session(&conn, &template.id, Utc::now()).unwrap();

        let table = parse_csv(b"name,unused\nBob,x\nCarol,y\n").unwrap();
        let result = import_table(&mut conn, &session.id, &table).unwrap();
        assert_eq!(
            result,
            CsvImportResult {
                imported: 2,
                matched_fields: vec!["Name".into()]
            }
        );

        let rows = db::load_rows(&conn, &session.id).unwrap();
        let stored = db::load_template(&conn, &template.id).unwrap();
        let field_id = &stored.schema.fields()[0].id;
        let names: Vec<&str> = rows.iter().map(|r| r.value_for(field_id)).collect();
        assert_eq!(names, vec!["Bob", "Carol"]);
    }
}
