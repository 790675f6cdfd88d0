use serde::{Deserialize, Serialize};

/// Lifecycle of a background batch-generation job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Percentage of rows generated so far.
    InProgress(u32),
    /// File name of the finished bundle.
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}

/// Whole-number percentage of `completed` out of `total`; an empty batch is
/// complete.
pub fn progress_percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_down_and_clamps() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(5, 3), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[test]
    fn status_serializes_externally_tagged() {
        let json = serde_json::to_string(&JobStatus::InProgress(40)).unwrap();
        assert_eq!(json, r#"{"InProgress":40}"#);
        let back: JobStatus = serde_json::from_str(r#""Pending""#).unwrap();
        assert_eq!(back, JobStatus::Pending);
        assert!(!back.is_finished());
    }
}
