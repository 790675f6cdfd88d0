use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};

/// Handler for `GET /api/templates`.
pub async fn process(config: web::Data<AppConfig>) -> impl Responder {
    match db::open(&config.database).and_then(|conn| db::list_templates(&conn)) {
        Ok(summaries) => HttpResponse::Ok().json(summaries),
        Err(e) => e.to_response(),
    }
}
