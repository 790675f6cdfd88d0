//! CSV import into data sessions.
//!
//! - `POST /api/data_sources/csv/import/{session_id}`: multipart form with a
//!   `file` part ending in `.csv`. The delimiter is detected from the header
//!   line, columns are matched to the template's fields by name
//!   (case-insensitive, trimmed), and one data row per record is appended to
//!   the session. The response is a `CsvImportResult` with the number of rows
//!   imported and the field names that found a column.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod import;

const API_PATH: &str = "/api/data_sources/csv";

/// Configures and returns the Actix scope for CSV data source routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/import/{session_id}", post().to(import::process))
}
