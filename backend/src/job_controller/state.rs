//! Shared state of background jobs.
//!
//! Batch generation runs outside the request/response cycle. Workers never
//! write the job map directly: they push [`JobUpdate`] messages into a
//! channel and [`start_job_updater`] applies them, while the status endpoint
//! only takes read locks.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Status of every job plus the sender workers report through.
///
/// Created once in `main.rs` and shared with handlers as `web::Data`.
#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Creates the state and the receiver to hand to [`start_job_updater`].
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(buffer);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies job updates until every sender is dropped.
///
/// A job that already finished keeps its final status; late progress
/// messages from its forwarder are ignored.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if jobs.get(&update.job_id).is_some_and(JobStatus::is_finished) {
            continue;
        }
        jobs.insert(update.job_id, update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finished_jobs_ignore_late_progress() {
        let (state, rx) = JobsState::new(8);
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));

        let updates = [
            ("job_1", JobStatus::InProgress(50)),
            ("job_1", JobStatus::Completed("Invoice_documents.zip".into())),
            ("job_1", JobStatus::InProgress(100)),
            ("job_2", JobStatus::Pending),
        ];
        for (job_id, status) in updates {
            state
                .tx
                .send(JobUpdate {
                    job_id: job_id.into(),
                    status,
                })
                .await
                .unwrap();
        }

        // Updates apply in order, so job_2 showing up means job_1 is settled.
        while state.status("job_2").await.is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            state.status("job_1").await,
            Some(JobStatus::Completed("Invoice_documents.zip".into()))
        );
        updater.abort();
    }
}
