//! # excelifier-sync
//!
//! Batch PDF submission to the Excelifier document-conversion API, and
//! collection of the JSON results.
//!
//! ## Pipeline Overview
//!
//! Two independent jobs share a directory convention and nothing else. Run
//! them periodically (cron, systemd timer); each run is safe to repeat.
//!
//! ```text
//! DIR_IN/*.pdf ──submit──▶ POST /job ──▶ DIR_OUT/<uuid>/      + DIR_IN/Processed/*.pdf
//! DIR_OUT/<uuid>/ ──collect──▶ GET /job/<uuid> ──▶ DIR_OUT/<filename>.json, <uuid>/ removed
//! ```
//!
//! An empty `DIR_OUT/<uuid>/` directory means "awaiting result". Its absence
//! means the result was collected (or the job never existed).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use excelifier_sync::{collect_results, submit_pending, HttpJobApi, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::builder("/data/out", std::env::var("BEARER_TOKEN")?)
//!         .dir_in("/data/in")
//!         .build()?;
//!     let api = HttpJobApi::new(&config)?;
//!
//!     let submitted = submit_pending(&api, &config).await?;
//!     eprintln!("sent {} files", submitted.stats.submitted);
//!
//!     let collected = collect_results(&api, &config).await?;
//!     eprintln!("collected {} results", collected.stats.collected);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `excelifier-sync` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod collect;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod submit;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{CreateJobRequest, CreateJobResponse, HttpJobApi, JobApi, JobStatus};
pub use collect::collect_results;
pub use config::{SyncConfig, SyncConfigBuilder};
pub use error::{ItemError, SyncError};
pub use output::{
    CollectOutcome, CollectReport, CollectResult, CollectStats, SubmitReport, SubmitResult,
    SubmitStats,
};
pub use submit::submit_pending;
