use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use common::requests::OpenSessionRequest;

pub async fn process(config: web::Data<AppConfig>, payload: web::Json<OpenSessionRequest>) -> impl Responder {
    match db::open(&config.database).and_then(|conn| db::open_session(&conn, &payload.template_id, Utc::now())) {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(e) => e.to_response(),
    }
}
