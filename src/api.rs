//! The remote conversion API: wire types, the [`JobApi`] seam and its HTTP client.
//!
//! The API is not under our control; only three endpoints are used:
//!
//! ```text
//! POST /job                      {file, filename, notify?} → {status, uuid}
//! GET  /job/{uuid}               → JobStatus
//! GET  /job/{uuid}/result/json   → arbitrary JSON document
//! ```
//!
//! Jobs talk to the API only through [`JobApi`], so tests (and callers with
//! their own middleware) can hand in any implementation.

use crate::config::SyncConfig;
use crate::error::{ItemError, SyncError};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Body of `POST /job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// Standard base64 of the PDF bytes.
    pub file: String,
    /// Original file name, e.g. `invoice.pdf`.
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,
}

/// Successful response of `POST /job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJobResponse {
    #[serde(default)]
    pub status: String,
    pub uuid: String,
}

/// Job status record returned by `GET /job/{uuid}`.
///
/// Only `success` and `filename` drive the collector. The other fields are
/// informational; a missing, `null` or mistyped value becomes `None` rather
/// than failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "lenient")]
    pub pages: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub processing: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ocr: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub deleted: Option<bool>,
}

/// Accept any JSON value; keep it only if it converts to `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Operations the submitter and collector need from the remote API.
///
/// Errors are per-item: the caller logs them and moves on to the next file
/// or job.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Upload a document and start a conversion job.
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreateJobResponse, ItemError>;

    /// Fetch the status record of a job.
    async fn job_status(&self, uuid: &str) -> Result<JobStatus, ItemError>;

    /// Fetch the JSON result of a finished job.
    async fn job_result(&self, uuid: &str) -> Result<serde_json::Value, ItemError>;
}

/// [`JobApi`] over HTTPS with a static bearer token.
pub struct HttpJobApi {
    client: Client,
    base: Url,
    token: String,
}

impl HttpJobApi {
    /// Build a client from the configured base URL, token and timeout.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let base = Url::parse(&config.api_base_url)
            .map_err(|e| SyncError::InvalidConfig(format!("API base URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(SyncError::InvalidConfig(format!(
                "API base URL '{}' cannot carry a path",
                config.api_base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base,
            token: config.bearer_token.clone(),
        })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ItemError> {
        let url_str = url.to_string();
        debug!("GET {}", url_str);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ItemError::from_reqwest(&url_str, e))?;
        let response = ensure_success(&url_str, response)?;
        response
            .json::<T>()
            .await
            .map_err(|e| ItemError::from_reqwest(&url_str, e))
    }
}

fn ensure_success(url: &str, response: Response) -> Result<Response, ItemError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ItemError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreateJobResponse, ItemError> {
        let url = self.endpoint(&["job"]);
        let url_str = url.to_string();
        debug!(
            "POST {} ({} base64 bytes for {})",
            url_str,
            request.file.len(),
            request.filename
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| ItemError::from_reqwest(&url_str, e))?;
        let response = ensure_success(&url_str, response)?;
        response
            .json::<CreateJobResponse>()
            .await
            .map_err(|e| ItemError::from_reqwest(&url_str, e))
    }

    async fn job_status(&self, uuid: &str) -> Result<JobStatus, ItemError> {
        self.get_json(self.endpoint(&["job", uuid])).await
    }

    async fn job_result(&self, uuid: &str) -> Result<serde_json::Value, ItemError> {
        self.get_json(self.endpoint(&["job", uuid, "result", "json"]))
            .await
    }
}
