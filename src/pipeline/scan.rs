//! Directory scanning: pending input files and in-flight tracking directories.
//!
//! Both listings are non-recursive and sorted by name so a run processes
//! items in a stable order regardless of what the filesystem returns.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix a file name must end with to be submitted. Case-sensitive.
pub const PDF_SUFFIX: &str = ".pdf";

/// A pending input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// File name inside the input directory, e.g. `invoice.pdf`.
    pub file_name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// Whether `name` is submitted as a PDF (`.pdf` suffix, exact case).
pub fn is_pdf_name(name: &str) -> bool {
    name.ends_with(PDF_SUFFIX)
}

/// List regular files directly inside `dir` whose name ends with `.pdf`.
///
/// Subdirectories (including `Processed/`) are never descended into.
pub async fn pending_pdfs(dir: &Path) -> io::Result<Vec<PendingFile>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                if is_pdf_name(&raw.to_string_lossy()) {
                    warn!("Skipping PDF with non UTF-8 name: {}", entry.path().display());
                }
                continue;
            }
        };
        if !is_pdf_name(&name) {
            continue;
        }
        // file_type() does not follow symlinks; metadata() does.
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(PendingFile {
                file_name: name,
                path,
            }),
            Ok(_) => debug!("Skipping non-file entry {}", path.display()),
            Err(e) => warn!("Cannot stat {}: {}", path.display(), e),
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// List the names of immediate subdirectories of `dir`; each one is a job UUID.
pub async fn tracking_dirs(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut uuids = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_dir = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.is_dir(),
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                false
            }
        };
        if !is_dir {
            continue;
        }
        match utf8_name(entry.file_name()) {
            Some(name) => uuids.push(name),
            None => warn!("Skipping tracking directory with non UTF-8 name: {}", path.display()),
        }
    }

    uuids.sort();
    Ok(uuids)
}

fn utf8_name(name: OsString) -> Option<String> {
    name.into_string().ok()
}
