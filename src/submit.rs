//! The submit job: upload pending PDFs and record each job as a tracking directory.
//!
//! Files are handled one at a time, in name order. A file leaves the input
//! directory only after its tracking directory exists, so an interrupted run
//! never loses track of an upload it has not recorded.

use crate::api::{CreateJobRequest, JobApi};
use crate::config::SyncConfig;
use crate::error::{ItemError, SyncError};
use crate::output::{SubmitReport, SubmitResult, SubmitStats};
use crate::pipeline::scan::PendingFile;
use crate::pipeline::{encode, fs_ops, scan};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// Upload every pending PDF in `config.dir_in`.
///
/// # Returns
/// `Ok(SubmitReport)` once every file has been attempted, even if some
/// failed (check `report.stats.failed`). Failed files stay in the input
/// directory for the next run.
///
/// # Errors
/// Returns `Err(SyncError)` only when the batch cannot start: `dir_in` is
/// not configured or cannot be listed.
pub async fn submit_pending(
    api: &dyn JobApi,
    config: &SyncConfig,
) -> Result<SubmitReport, SyncError> {
    let start = Instant::now();
    let dir_in = config.input_dir()?;
    let processed_dir = config.processed_dir()?;
    info!("Starting to process files in {}", dir_in.display());

    let pending = scan::pending_pdfs(dir_in)
        .await
        .map_err(|source| SyncError::InputDirUnreadable {
            path: dir_in.to_path_buf(),
            source,
        })?;
    info!("Currently {} files to process", pending.len());

    let mut files = Vec::with_capacity(pending.len());
    for file in &pending {
        info!("About to send file {}", file.file_name);
        let result = match submit_one(api, config, &processed_dir, file).await {
            Ok(uuid) => SubmitResult {
                file_name: file.file_name.clone(),
                uuid: Some(uuid),
                error: None,
            },
            Err((uuid, e)) => {
                error!("Error processing file {}: {}", file.file_name, e);
                SubmitResult {
                    file_name: file.file_name.clone(),
                    uuid,
                    error: Some(e),
                }
            }
        };
        files.push(result);
    }

    let submitted = files.iter().filter(|f| f.is_submitted()).count();
    let stats = SubmitStats {
        total_files: files.len(),
        submitted,
        failed: files.len() - submitted,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Submit complete: {}/{} files sent, {}ms",
        stats.submitted, stats.total_files, stats.duration_ms
    );

    Ok(SubmitReport { files, stats })
}

/// Upload one file, create its tracking directory, then move it to `Processed/`.
///
/// On failure after the API accepted the upload, the job id is returned
/// alongside the error so the report still shows it.
async fn submit_one(
    api: &dyn JobApi,
    config: &SyncConfig,
    processed_dir: &Path,
    file: &PendingFile,
) -> Result<String, (Option<String>, ItemError)> {
    let encoded = encode::encode_file(&file.path)
        .await
        .map_err(|e| (None, ItemError::fs("read", &file.path, e)))?;

    let request = CreateJobRequest {
        file: encoded,
        filename: file.file_name.clone(),
        notify: config.notify_email.clone(),
    };
    let response = api.create_job(&request).await.map_err(|e| (None, e))?;
    let uuid = response.uuid;
    info!("Got uuid from Excelifier: {}", uuid);

    if !fs_ops::is_safe_job_id(&uuid) {
        return Err((None, ItemError::InvalidJobId { uuid }));
    }

    let fail = |e: ItemError| (Some(uuid.clone()), e);

    fs_ops::ensure_dir(&config.tracking_dir(&uuid))
        .await
        .map_err(fail)?;

    fs_ops::ensure_dir(processed_dir).await.map_err(fail)?;
    fs_ops::move_file(&file.path, &processed_dir.join(&file.file_name))
        .await
        .map_err(fail)?;
    info!("Moved {} to {}", file.file_name, processed_dir.display());

    Ok(uuid)
}
