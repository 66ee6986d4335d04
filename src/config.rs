//! Configuration for the submit and collect jobs.
//!
//! All job behaviour is controlled through [`SyncConfig`], built via its
//! [`SyncConfigBuilder`]. The config is constructed once at process start and
//! passed into each job function; the library never reads the process
//! environment itself, so tests can point a job at temporary directories and
//! a fake API without touching global state.

use crate::error::SyncError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Base URL of the hosted Excelifier API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.excelifier.com";

/// Subdirectory of the input directory that receives submitted PDFs.
pub const DEFAULT_PROCESSED_DIR: &str = "Processed";

/// Configuration shared by the submitter and the collector.
///
/// # Example
/// ```rust
/// use excelifier_sync::SyncConfig;
///
/// let config = SyncConfig::builder("/data/out", "secret-token")
///     .dir_in("/data/in")
///     .notify_email("ops@example.com")
///     .build()
///     .unwrap();
/// assert_eq!(config.processed_dir().unwrap(), std::path::Path::new("/data/in/Processed"));
/// ```
#[derive(Clone)]
pub struct SyncConfig {
    /// Directory scanned for pending `.pdf` files. Only the submitter needs it.
    pub dir_in: Option<PathBuf>,

    /// Directory holding tracking directories and collected `<filename>.json` results.
    pub dir_out: PathBuf,

    /// Static bearer token sent on every request.
    pub bearer_token: String,

    /// Address the API emails when a job finishes. Omitted from the request when `None`.
    pub notify_email: Option<String>,

    /// API root, without the `/job` suffix. Default: [`DEFAULT_API_BASE_URL`].
    pub api_base_url: String,

    /// Per-request timeout. Default: `None`, requests may wait indefinitely.
    pub request_timeout_secs: Option<u64>,

    /// Name of the subdirectory of `dir_in` that submitted files are moved to.
    /// Default: [`DEFAULT_PROCESSED_DIR`].
    pub processed_dir_name: String,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("dir_in", &self.dir_in)
            .field("dir_out", &self.dir_out)
            .field("bearer_token", &"<redacted>")
            .field("notify_email", &self.notify_email)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("processed_dir_name", &self.processed_dir_name)
            .finish()
    }
}

impl SyncConfig {
    /// Create a new builder. The output directory and token are always required.
    pub fn builder(dir_out: impl Into<PathBuf>, bearer_token: impl Into<String>) -> SyncConfigBuilder {
        SyncConfigBuilder {
            config: SyncConfig {
                dir_in: None,
                dir_out: dir_out.into(),
                bearer_token: bearer_token.into(),
                notify_email: None,
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                request_timeout_secs: None,
                processed_dir_name: DEFAULT_PROCESSED_DIR.to_string(),
            },
        }
    }

    /// The input directory, or an error when the submitter runs without one.
    pub fn input_dir(&self) -> Result<&Path, SyncError> {
        self.dir_in
            .as_deref()
            .ok_or_else(|| SyncError::InvalidConfig("DIR_IN is required to submit files".into()))
    }

    /// `<dir_in>/<processed_dir_name>`.
    pub fn processed_dir(&self) -> Result<PathBuf, SyncError> {
        Ok(self.input_dir()?.join(&self.processed_dir_name))
    }

    /// `<dir_out>/<uuid>`.
    pub fn tracking_dir(&self, uuid: &str) -> PathBuf {
        self.dir_out.join(uuid)
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn dir_in(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dir_in = Some(dir.into());
        self
    }

    /// Set the notification address. An empty string clears it.
    pub fn notify_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.config.notify_email = if email.trim().is_empty() {
            None
        } else {
            Some(email)
        };
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn processed_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.processed_dir_name = name.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SyncConfig, SyncError> {
        let c = &self.config;
        if c.bearer_token.trim().is_empty() {
            return Err(SyncError::InvalidConfig("BEARER_TOKEN must not be empty".into()));
        }
        if c.dir_out.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig("DIR_OUT must not be empty".into()));
        }
        if c.dir_in.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
            return Err(SyncError::InvalidConfig("DIR_IN must not be empty".into()));
        }
        let url = reqwest::Url::parse(&c.api_base_url).map_err(|e| {
            SyncError::InvalidConfig(format!("API base URL '{}' is invalid: {e}", c.api_base_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidConfig(format!(
                "API base URL must be http or https, got '{}'",
                c.api_base_url
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(SyncError::InvalidConfig("Request timeout must be ≥ 1 second".into()));
        }
        let name = &c.processed_dir_name;
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(SyncError::InvalidConfig(format!(
                "Processed directory name must be a single path component, got {name:?}"
            )));
        }
        Ok(self.config)
    }
}
