//! Error types for the excelifier-sync library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SyncError`] — **Fatal**: the batch cannot start at all (directory
//!   cannot be listed, configuration is invalid, HTTP client cannot be
//!   built). Returned as `Err(SyncError)` from [`crate::submit_pending`] and
//!   [`crate::collect_results`].
//!
//! * [`ItemError`] — **Non-fatal**: one file or one job failed (HTTP error,
//!   network failure, filesystem error) but the rest of the batch carries on.
//!   Stored inside [`crate::output::SubmitResult`] and
//!   [`crate::output::CollectResult`] so callers can see exactly which items
//!   are left for the next run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the excelifier-sync library.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Directory errors ──────────────────────────────────────────────────
    /// The input directory could not be listed.
    #[error("Cannot read input directory '{path}': {source}\nCheck DIR_IN points at an existing, readable directory.")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be listed.
    #[error("Cannot read output directory '{path}': {source}\nCheck DIR_OUT points at an existing, readable directory.")]
    OutputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The reqwest client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// A non-fatal error for a single file or job.
///
/// The item is left where it was (input file stays pending, tracking
/// directory stays in place) so a later run picks it up again.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemError {
    /// The API answered with a non-2xx status.
    #[error("HTTP error! status: {status} ({url})")]
    HttpStatus { url: String, status: u16 },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("Request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    /// The response body was not the JSON we expected.
    #[error("Unexpected response body from {url}: {detail}")]
    Decode { url: String, detail: String },

    /// A local read, write, move, mkdir or rmdir failed.
    #[error("Failed to {op} '{path}': {detail}")]
    Filesystem {
        op: String,
        path: PathBuf,
        detail: String,
    },

    /// The API returned a job id that cannot be used as a directory name.
    #[error("Unusable job id {uuid:?}")]
    InvalidJobId { uuid: String },
}

impl ItemError {
    /// Wrap an I/O error with the operation and path that produced it.
    pub fn fs(op: &str, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        ItemError::Filesystem {
            op: op.to_string(),
            path: path.into(),
            detail: err.to_string(),
        }
    }

    /// Classify a reqwest error as transport or decode failure.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            ItemError::Decode {
                url: url.to_string(),
                detail: err.to_string(),
            }
        } else {
            ItemError::Transport {
                url: url.to_string(),
                detail: err.to_string(),
            }
        }
    }
}
