use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use common::requests::RenameSessionRequest;

pub async fn process(
    config: web::Data<AppConfig>,
    session_id: web::Path<String>,
    payload: web::Json<RenameSessionRequest>,
) -> impl Responder {
    let result = db::open(&config.database)
        .and_then(|conn| db::rename_session(&conn, &session_id, &payload.name, Utc::now()));
    match result {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(e) => e.to_response(),
    }
}
