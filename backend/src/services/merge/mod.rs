//! Batch generation of one document per data row.
//!
//! - `POST /api/merge/start`: schedules a job for a template and its session,
//!   answering with the job id right away.
//! - `GET /api/merge/status/{job_id}`: the current `JobStatus`.
//! - `GET /api/merge/download/{job_id}`: the finished zip bundle.

mod download;
mod start;
mod status;

use actix_web::web;

const API_PATH: &str = "/api/merge";

/// Configures and returns the Actix `Scope` for all merge-related routes.
pub fn configure_routes() -> actix_web::Scope {
    web::scope(API_PATH)
        .route("/start", web::post().to(start::process))
        .route("/status/{job_id}", web::get().to(status::process))
        .route("/download/{job_id}", web::get().to(download::process))
}

/// Path of the bundle written by a finished job.
pub(crate) fn bundle_path(output_dir: &std::path::Path, job_id: &str) -> std::path::PathBuf {
    output_dir.join(format!("{}.zip", job_id))
}
