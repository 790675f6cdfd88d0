//! Data sessions and their rows.
//!
//! Each template has one session, created on first open. Rows of a session
//! are stored in input order, which is also the order documents are
//! generated in.
//!
//! - `POST /api/sessions/open`: get-or-create the session of a template.
//! - `PUT /api/sessions/{session_id}/name`: rename.
//! - `GET /api/sessions/{session_id}/rows`: rows in order.
//! - `PUT /api/sessions/{session_id}/rows`: replace all rows atomically.

mod open;
mod rename;
mod rows;

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/sessions";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/open", post().to(open::process))
        .route("/{session_id}/name", put().to(rename::process))
        .route("/{session_id}/rows", get().to(rows::list))
        .route("/{session_id}/rows", put().to(rows::replace))
}
