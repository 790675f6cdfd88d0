use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use common::model::data::DataRow;

pub async fn list(config: web::Data<AppConfig>, session_id: web::Path<String>) -> impl Responder {
    match db::open(&config.database).and_then(|conn| db::load_rows(&conn, &session_id)) {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => e.to_response(),
    }
}

/// Replaces every row of the session; either all rows are stored or none.
pub async fn replace(
    config: web::Data<AppConfig>,
    session_id: web::Path<String>,
    payload: web::Json<Vec<DataRow>>,
) -> impl Responder {
    let result = db::open(&config.database)
        .and_then(|mut conn| db::replace_rows(&mut conn, &session_id, &payload, Utc::now()));
    match result {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.to_response(),
    }
}
