use super::bundle_path;
use crate::config::AppConfig;
use crate::job_controller::state::JobsState;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType, CONTENT_DISPOSITION};
use actix_web::{web, HttpResponse, Responder};
use common::generator::ZIP_MIME;
use common::jobs::JobStatus;
use log::error;

/// Handler for `GET /api/merge/download/{job_id}`.
///
/// Only a completed job has a bundle; any other status answers `409`.
pub(crate) async fn process(
    state: web::Data<JobsState>,
    config: web::Data<AppConfig>,
    job_id: web::Path<String>,
) -> impl Responder {
    let file_name = match state.status(&job_id).await {
        Some(JobStatus::Completed(file_name)) => file_name,
        Some(other) => return HttpResponse::Conflict().body(format!("Job {} is not complete: {:?}", job_id, other)),
        None => return HttpResponse::NotFound().body(format!("Job {} not found", job_id)),
    };

    let path = bundle_path(&config.output_dir, &job_id);
    match std::fs::read(&path) {
        Ok(bytes) => {
            let disposition = ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(file_name)],
            };
            HttpResponse::Ok()
                .content_type(ZIP_MIME)
                .insert_header((CONTENT_DISPOSITION, disposition))
                .body(bytes)
        }
        Err(e) => {
            error!("Bundle {} is unreadable: {}", path.display(), e);
            HttpResponse::NotFound().body("Bundle is no longer available")
        }
    }
}
