//! # Template Retrieval Service
//!
//! Backs `GET /api/templates/{template_id}`: loads the template row, decodes
//! its stored schema and returns the full `Template`, with the original
//! document encoded as base64 in the JSON body.

use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};

/// # Returns
/// - `200 OK` with the `Template` as JSON.
/// - `404 Not Found` when no template has this id.
/// - `503 Service Unavailable` on database errors.
pub async fn process(config: web::Data<AppConfig>, template_id: web::Path<String>) -> impl Responder {
    match db::open(&config.database).and_then(|conn| db::load_template(&conn, &template_id)) {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => e.to_response(),
    }
}
