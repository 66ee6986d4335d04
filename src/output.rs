//! Per-item results and batch statistics returned by the two jobs.

use crate::error::ItemError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one input file during a submit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResult {
    /// File name inside the input directory.
    pub file_name: String,
    /// Job id assigned by the API, when the upload succeeded.
    pub uuid: Option<String>,
    /// Set when the file was left pending.
    pub error: Option<ItemError>,
}

impl SubmitResult {
    pub fn is_submitted(&self) -> bool {
        self.error.is_none() && self.uuid.is_some()
    }
}

/// Counters for a submit run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitStats {
    /// PDFs found in the input directory.
    pub total_files: usize,
    /// Uploaded and moved to `Processed/`.
    pub submitted: usize,
    /// Left in the input directory.
    pub failed: usize,
    pub duration_ms: u64,
}

/// Result of [`crate::submit_pending`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReport {
    pub files: Vec<SubmitResult>,
    pub stats: SubmitStats,
}

/// State of one tracking directory after a collect run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CollectOutcome {
    /// Result saved and tracking directory removed.
    Collected { result_path: PathBuf },
    /// The API reported `success = false`; the job is still processing or has failed.
    NotReady,
    /// A request or filesystem step failed; the tracking directory is kept.
    Failed { error: ItemError },
}

/// What happened to one tracking directory during a collect run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectResult {
    pub uuid: String,
    pub outcome: CollectOutcome,
}

/// Counters for a collect run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectStats {
    /// Tracking directories found.
    pub total_jobs: usize,
    pub collected: usize,
    pub not_ready: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Result of [`crate::collect_results`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectReport {
    pub jobs: Vec<CollectResult>,
    pub stats: CollectStats,
}
