use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};

/// Handler for `GET /api/merge/status/{job_id}`.
pub(crate) async fn process(state: web::Data<JobsState>, job_id: web::Path<String>) -> impl Responder {
    match state.status(&job_id).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().body(format!("Job {} not found", job_id)),
    }
}
