//! The collect job: poll each tracked job and save finished results.
//!
//! A tracking directory is removed only after the job reported
//! `success = true` and its result was written to disk. Jobs that are still
//! processing and jobs that failed remotely look the same (`success = false`)
//! and are both left in place for the next run.

use crate::api::JobApi;
use crate::config::SyncConfig;
use crate::error::{ItemError, SyncError};
use crate::output::{CollectOutcome, CollectReport, CollectResult, CollectStats};
use crate::pipeline::{fs_ops, scan};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Check every tracking directory in `config.dir_out` and collect finished jobs.
///
/// # Returns
/// `Ok(CollectReport)` once every job has been checked, whatever the
/// individual outcomes.
///
/// # Errors
/// Returns `Err(SyncError)` only when `dir_out` cannot be listed.
pub async fn collect_results(
    api: &dyn JobApi,
    config: &SyncConfig,
) -> Result<CollectReport, SyncError> {
    let start = Instant::now();
    info!("Starting to process results in {}", config.dir_out.display());

    let uuids = scan::tracking_dirs(&config.dir_out)
        .await
        .map_err(|source| SyncError::OutputDirUnreadable {
            path: config.dir_out.clone(),
            source,
        })?;
    info!("Currently {} results to process", uuids.len());

    let mut jobs = Vec::with_capacity(uuids.len());
    for uuid in uuids {
        info!("Processing {}", uuid);
        let outcome = match collect_one(api, config, &uuid).await {
            Ok(Some(result_path)) => CollectOutcome::Collected { result_path },
            Ok(None) => {
                warn!("Job {} is not ready or failed.", uuid);
                CollectOutcome::NotReady
            }
            Err(e) => {
                error!("Error collecting job {}: {}", uuid, e);
                warn!("Job {} is not ready or failed.", uuid);
                CollectOutcome::Failed { error: e }
            }
        };
        jobs.push(CollectResult { uuid, outcome });
    }

    let mut stats = CollectStats {
        total_jobs: jobs.len(),
        ..CollectStats::default()
    };
    for job in &jobs {
        match job.outcome {
            CollectOutcome::Collected { .. } => stats.collected += 1,
            CollectOutcome::NotReady => stats.not_ready += 1,
            CollectOutcome::Failed { .. } => stats.failed += 1,
        }
    }
    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Collect complete: {}/{} collected, {} not ready, {} failed, {}ms",
        stats.collected, stats.total_jobs, stats.not_ready, stats.failed, stats.duration_ms
    );

    Ok(CollectReport { jobs, stats })
}

/// Check one job. `Ok(None)` means not ready; `Ok(Some(path))` means the
/// result was saved at `path` and the tracking directory is gone.
async fn collect_one(
    api: &dyn JobApi,
    config: &SyncConfig,
    uuid: &str,
) -> Result<Option<PathBuf>, ItemError> {
    let status = api.job_status(uuid).await?;
    if !status.success {
        return Ok(None);
    }
    info!("Job {} is successful, let's fetch it", uuid);

    let result = api.job_result(uuid).await?;

    let result_path = config
        .dir_out
        .join(fs_ops::result_file_name(&status.filename, uuid));
    fs_ops::write_json(&result_path, &result).await?;
    info!("Saved result for {} as {}", uuid, result_path.display());

    fs_ops::remove_tracking_dir(&config.tracking_dir(uuid)).await?;
    info!("Deleted directory for UUID: {}", uuid);

    Ok(Some(result_path))
}
