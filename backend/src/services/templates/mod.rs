//! # Template Service Module
//!
//! Routes everything under `/api/templates`: uploading `.docx` files, listing
//! and fetching stored templates, saving whole templates, deleting them, and
//! editing the field schema one field at a time.
//!
//! ## Sub-modules:
//! - `upload`: multipart upload of a new `.docx`.
//! - `list` / `get`: read access.
//! - `save`: upsert of a complete template (schema validated).
//! - `delete`: removes a template with its session and rows.
//! - `fields`: add, update and delete single fields.

mod delete;
pub(crate) mod fields;
mod get;
mod list;
mod save;
mod upload;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /upload`**: multipart form with a `json` part (`{"name": ...}`)
///     followed by a `file` part holding the `.docx`. Returns the new `Template`.
/// *   **`GET /`**: lists `TemplateSummary` entries, newest first.
/// *   **`POST /save`**: stores a complete `Template`. The schema must pass
///     `FieldStore::validate`; the stored document of an existing template is kept.
/// *   **`GET /{template_id}`**: the full `Template`, document as base64.
/// *   **`DELETE /{template_id}`**: removes the template, its session and rows.
/// *   **`POST /{template_id}/fields`**: adds a field from a `FieldDraft`. The
///     placeholder must match the document text at its offsets and must not
///     overlap an existing field (`409`).
/// *   **`PUT /{template_id}/fields/{field_id}`**: renames or retypes a field.
/// *   **`DELETE /{template_id}/fields/{field_id}`**: removes a field.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/upload", post().to(upload::process))
        .route("/save", post().to(save::process))
        .route("/{template_id}", get().to(get::process))
        .route("/{template_id}", delete().to(delete::process))
        .route("/{template_id}/fields", post().to(fields::add))
        .route("/{template_id}/fields/{field_id}", put().to(fields::update))
        .route("/{template_id}/fields/{field_id}", delete().to(fields::remove))
}
