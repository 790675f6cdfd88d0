//! # Merge Job Start Service
//!
//! `POST /api/merge/start` turns every data row of a session into one
//! generated `.docx` and packs them into a zip bundle.
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: `process` receives a `StartMergeRequest` naming the
//!     template and its session. Mismatched or empty sessions are rejected
//!     before a job exists.
//!
//! 2.  **Job Scheduling**: `schedule_merge_job` registers the job as `Pending`,
//!     returns its id and spawns a Tokio task that owns the job's lifecycle.
//!
//! 3.  **Background Processing**: the task runs `merge_blocking` through
//!     `tokio::task::spawn_blocking`, so zip work never blocks the runtime.
//!
//! 4.  **Progress Reporting**: the worker sends `MergeUpdate`s after each row.
//!     A forwarder turns them into percentages for the job controller.
//!
//! 5.  **Bundle**: the documents are zipped into a temporary file inside the
//!     output directory and persisted as `{job_id}.zip`. The job completes with
//!     the bundle's download name.

use super::bundle_path;
use crate::config::AppConfig;
use crate::db::{self, StorageError};
use crate::job_controller::state::{JobUpdate, JobsState};
use actix_web::{web, HttpResponse, Responder};
use common::generator::{bundle_documents, bundle_file_name, generate_all_documents};
use common::ids::generate_id;
use common::jobs::{progress_percent, JobStatus};
use common::requests::{StartMergeRequest, StartMergeResponse};
use log::{error, info};
use rusqlite::Connection;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Progress sent from the blocking worker to its async forwarder.
#[derive(Debug)]
pub enum MergeUpdate {
    /// Replaces the whole job status.
    Job(JobStatus),
    /// `completed` of `total` rows are generated.
    Task { completed: usize, total: usize },
}

/// The Actix web handler for `POST /api/merge/start`.
pub(crate) async fn process(
    state: web::Data<JobsState>,
    config: web::Data<AppConfig>,
    payload: web::Json<StartMergeRequest>,
) -> impl Responder {
    let req = payload.into_inner();
    let checked = db::open(&config.database).and_then(|conn| check_request(&conn, &req));
    if let Err(e) = checked {
        return e.to_response();
    }

    let job_id = schedule_merge_job(state, req, config.database.clone(), config.output_dir.clone()).await;
    HttpResponse::Ok().json(StartMergeResponse { job_id })
}

/// The session must belong to the template and hold at least one row.
fn check_request(conn: &Connection, req: &StartMergeRequest) -> Result<(), StorageError> {
    let session = db::load_session(conn, &req.session_id)?;
    if session.template_id != req.template_id {
        return Err(StorageError::Invalid(format!(
            "Session {} does not belong to template {}",
            session.id, req.template_id
        )));
    }
    db::load_template(conn, &req.template_id)?;
    if db::load_rows(conn, &session.id)?.is_empty() {
        return Err(StorageError::Invalid("The session has no data rows".into()));
    }
    Ok(())
}

/// Registers the job as `Pending` and runs it in the background.
async fn schedule_merge_job(
    state: web::Data<JobsState>,
    req: StartMergeRequest,
    database: PathBuf,
    output_dir: PathBuf,
) -> String {
    let job_id = generate_id("job");
    state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);

    let tx = state.tx.clone();
    let job_id_clone = job_id.clone();

    tokio::spawn(async move {
        let (merge_tx, mut merge_rx) = mpsc::channel::<MergeUpdate>(100);

        let job_updater_tx = tx.clone();
        let job_id_for_updater = job_id_clone.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(update) = merge_rx.recv().await {
                let status = match update {
                    MergeUpdate::Job(job_status) => job_status,
                    MergeUpdate::Task { completed, total } => {
                        JobStatus::InProgress(progress_percent(completed, total))
                    }
                };
                let _ = job_updater_tx
                    .send(JobUpdate {
                        job_id: job_id_for_updater.clone(),
                        status,
                    })
                    .await;
            }
        });

        let job_id_for_blocking = job_id_clone.clone();
        let handle = tokio::task::spawn_blocking(move || {
            merge_blocking(merge_tx, &job_id_for_blocking, &req, &database, &output_dir)
        });

        let status = match handle.await {
            Ok(Ok(file_name)) => JobStatus::Completed(file_name),
            Ok(Err(e)) => {
                error!("Merge job {} failed: {}", job_id_clone, e);
                JobStatus::Failed(e)
            }
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };
        // Progress must land before the final status.
        let _ = forwarder.await;
        let _ = tx
            .send(JobUpdate {
                job_id: job_id_clone,
                status,
            })
            .await;
    });

    job_id
}

/// Synchronous body of a merge job, run via `spawn_blocking`.
///
/// Returns the download name of the bundle.
fn merge_blocking(
    tx: mpsc::Sender<MergeUpdate>,
    job_id: &str,
    req: &StartMergeRequest,
    database: &Path,
    output_dir: &Path,
) -> Result<String, String> {
    let _ = tx.blocking_send(MergeUpdate::Job(JobStatus::InProgress(0)));
    run_merge(&tx, job_id, req, database, output_dir).map_err(|e| e.to_string())
}

fn run_merge(
    tx: &mpsc::Sender<MergeUpdate>,
    job_id: &str,
    req: &StartMergeRequest,
    database: &Path,
    output_dir: &Path,
) -> Result<String, StorageError> {
    let conn = db::open(database)?;
    check_request(&conn, req)?;
    let template = db::load_template(&conn, &req.template_id)?;
    let rows = db::load_rows(&conn, &req.session_id)?;
    drop(conn);

    let documents = generate_all_documents(&template, &rows, |completed, total| {
        let _ = tx.blocking_send(MergeUpdate::Task { completed, total });
    })?;
    let bundle = bundle_documents(&documents, &template, &rows)?;

    fs::create_dir_all(output_dir)?;
    let mut file = tempfile::NamedTempFile::new_in(output_dir)?;
    file.write_all(&bundle)?;
    let path = bundle_path(output_dir, job_id);
    file.persist(&path).map_err(|e| e.error)?;

    info!(
        "Merge job {} wrote {} document(s) to {}",
        job_id,
        documents.len(),
        path.display()
    );
    Ok(bundle_file_name(&template))
}
