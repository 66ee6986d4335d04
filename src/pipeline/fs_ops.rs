//! Filesystem steps: mkdir, move, result write and tracking-directory removal.
//!
//! Every step is safe to repeat. A run that dies halfway leaves the tree in a
//! state the next run can pick up from.

use crate::error::ItemError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Create `dir` and any missing parents. Succeeds if it already exists.
pub async fn ensure_dir(dir: &Path) -> Result<(), ItemError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ItemError::fs("create directory", dir, e))
}

/// Move `from` to `to`, replacing any file already at `to`.
///
/// Falls back to copy + delete when the two paths are on different
/// filesystems.
pub async fn move_file(from: &Path, to: &Path) -> Result<(), ItemError> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "{} and {} are on different devices, copying",
                from.display(),
                to.display()
            );
            tokio::fs::copy(from, to)
                .await
                .map_err(|e| ItemError::fs("copy", from, e))?;
            tokio::fs::remove_file(from)
                .await
                .map_err(|e| ItemError::fs("remove", from, e))
        }
        Err(e) => Err(ItemError::fs("move", from, e)),
    }
}

/// Write `value` to `path` as 2-space indented JSON plus a trailing newline.
///
/// Creates the parent directory if needed. Uses atomic write (temp file +
/// rename) so a crash never leaves a truncated result behind.
pub async fn write_json(path: &Path, value: &serde_json::Value) -> Result<(), ItemError> {
    let mut body = serde_json::to_string_pretty(value).map_err(|e| ItemError::Filesystem {
        op: "serialise".into(),
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    body.push('\n');

    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, body)
        .await
        .map_err(|e| ItemError::fs("write", &tmp_path, e))?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(ItemError::fs("write", path, e));
    }
    Ok(())
}

/// Remove a tracking directory and anything that ended up inside it.
/// Succeeds if it is already gone.
pub async fn remove_tracking_dir(dir: &Path) -> Result<(), ItemError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ItemError::fs("remove directory", dir, e)),
    }
}

/// Whether a job id from the API can be used as a single directory name.
pub fn is_safe_job_id(uuid: &str) -> bool {
    !uuid.is_empty()
        && uuid != "."
        && uuid != ".."
        && !uuid.contains(['/', '\\', '\0'])
}

/// File name for a collected result: `<filename>.json`.
///
/// Only the last path component of the reported filename is used. Falls back
/// to the job id when nothing usable remains.
pub fn result_file_name(reported: &str, uuid: &str) -> String {
    let base = reported.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = if base.is_empty() || base == "." || base == ".." {
        uuid
    } else {
        base
    };
    format!("{stem}.json")
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
