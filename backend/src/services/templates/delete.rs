use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};

/// Handler for `DELETE /api/templates/{template_id}`.
pub async fn process(config: web::Data<AppConfig>, template_id: web::Path<String>) -> impl Responder {
    match db::open(&config.database).and_then(|mut conn| db::delete_template(&mut conn, &template_id)) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.to_response(),
    }
}
