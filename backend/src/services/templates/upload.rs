use crate::config::AppConfig;
use crate::db::{self, StorageError};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use common::requests::UploadTemplateRequest;
use futures_util::StreamExt;
use log::info;
use serde_json::from_slice;

/// Handler for `POST /api/templates/upload`.
///
/// - On success: `200 OK` with the created `Template` as JSON.
/// - On failure: the status mapped from the `StorageError`.
pub async fn process(config: web::Data<AppConfig>, payload: Multipart) -> impl Responder {
    match upload_template(&config, payload).await {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => e.to_response(),
    }
}

/// Reads the `json` and `file` parts and stores a new template with an empty
/// schema; `db::save_template` validates the document.
pub async fn upload_template(config: &AppConfig, mut payload: Multipart) -> Result<Template, StorageError> {
    let mut request: Option<UploadTemplateRequest> = None;
    let mut document: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| StorageError::Invalid(e.to_string()))?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match part_name.as_deref() {
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk.map_err(|e| StorageError::Invalid(e.to_string()))?);
                }
                request = Some(from_slice(&bytes)?);
            }
            Some("file") => {
                if request.is_none() {
                    return Err(StorageError::Invalid("Template JSON must be sent before the file".into()));
                }
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if !filename.to_lowercase().ends_with(".docx") {
                    return Err(StorageError::Invalid("The file must end with .docx".into()));
                }

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| StorageError::Invalid(e.to_string()))?;
                    if bytes.len() + chunk.len() > config.max_document_bytes {
                        return Err(StorageError::QuotaExceeded {
                            size: bytes.len() + chunk.len(),
                            limit: config.max_document_bytes,
                        });
                    }
                    bytes.extend_from_slice(&chunk);
                }
                document = Some(bytes);
            }
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| StorageError::Invalid(e.to_string()))?;
                }
            }
        }
    }

    let request = request.ok_or_else(|| StorageError::Invalid("Missing template JSON part".into()))?;
    let document = document.ok_or_else(|| StorageError::Invalid("Missing file part".into()))?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(StorageError::Invalid("Template name must not be empty".into()));
    }

    let template = Template::new(name, document);
    let mut conn = db::open(&config.database)?;
    db::save_template(&mut conn, &template, config.max_document_bytes)?;
    info!(
        "Stored template {} ({}, {} bytes)",
        template.id,
        template.name,
        template.original_document.len()
    );
    Ok(template)
}
