//! Integration tests for the submit and collect jobs.
//!
//! Each test builds a throwaway DIR_IN / DIR_OUT tree with `tempfile` and
//! drives the jobs against `FakeApi`, an in-memory stand-in for the remote
//! service that records every call.

use async_trait::async_trait;
use excelifier_sync::{
    collect_results, submit_pending, CollectOutcome, CreateJobRequest, CreateJobResponse,
    ItemError, JobApi, JobStatus, SyncConfig, SyncError,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeApi {
    /// filename → uuid handed out by `create_job`; missing means HTTP 500.
    uploads: HashMap<String, String>,
    /// uuid → status record; missing means HTTP 500.
    statuses: Mutex<HashMap<String, JobStatus>>,
    /// uuid → result document; missing means HTTP 404.
    results: HashMap<String, serde_json::Value>,
    /// Every create_job request, in order.
    requests: Mutex<Vec<CreateJobRequest>>,
    /// Every uuid passed to job_result, in order.
    result_fetches: Mutex<Vec<String>>,
}

impl FakeApi {
    fn accept(mut self, filename: &str, uuid: &str) -> Self {
        self.uploads.insert(filename.into(), uuid.into());
        self
    }

    fn status(self, uuid: &str, success: bool, filename: &str) -> Self {
        self.statuses.lock().unwrap().insert(
            uuid.into(),
            JobStatus {
                uuid: Some(uuid.into()),
                success,
                filename: filename.into(),
                processing: Some(!success),
                ..JobStatus::default()
            },
        );
        self
    }

    fn result(mut self, uuid: &str, value: serde_json::Value) -> Self {
        self.results.insert(uuid.into(), value);
        self
    }
}

#[async_trait]
impl JobApi for FakeApi {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreateJobResponse, ItemError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.uploads.get(&request.filename) {
            Some(uuid) => Ok(CreateJobResponse {
                status: "ok".into(),
                uuid: uuid.clone(),
            }),
            None => Err(ItemError::HttpStatus {
                url: "fake://job".into(),
                status: 500,
            }),
        }
    }

    async fn job_status(&self, uuid: &str) -> Result<JobStatus, ItemError> {
        self.statuses
            .lock()
            .unwrap()
            .get(uuid)
            .cloned()
            .ok_or_else(|| ItemError::HttpStatus {
                url: format!("fake://job/{uuid}"),
                status: 500,
            })
    }

    async fn job_result(&self, uuid: &str) -> Result<serde_json::Value, ItemError> {
        self.result_fetches.lock().unwrap().push(uuid.to_string());
        self.results
            .get(uuid)
            .cloned()
            .ok_or_else(|| ItemError::HttpStatus {
                url: format!("fake://job/{uuid}/result/json"),
                status: 404,
            })
    }
}

struct Dirs {
    _root: TempDir,
    dir_in: PathBuf,
    dir_out: PathBuf,
}

fn dirs() -> Dirs {
    let root = TempDir::new().unwrap();
    let dir_in = root.path().join("in");
    let dir_out = root.path().join("out");
    fs::create_dir(&dir_in).unwrap();
    fs::create_dir(&dir_out).unwrap();
    Dirs {
        _root: root,
        dir_in,
        dir_out,
    }
}

fn config(d: &Dirs) -> SyncConfig {
    SyncConfig::builder(&d.dir_out, "test-token")
        .dir_in(&d.dir_in)
        .build()
        .unwrap()
}

fn write_pdf(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"%PDF-1.4\n%test\n").unwrap();
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Route this thread's tracing output into a buffer until the guard drops.
fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

// ── Submit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_moves_file_and_creates_tracking_dir() {
    let d = dirs();
    write_pdf(&d.dir_in, "invoice.pdf");
    let api = FakeApi::default().accept("invoice.pdf", "abc-123");

    let report = submit_pending(&api, &config(&d)).await.unwrap();

    assert!(d.dir_out.join("abc-123").is_dir());
    assert!(d.dir_in.join("Processed/invoice.pdf").is_file());
    assert!(!d.dir_in.join("invoice.pdf").exists());
    assert_eq!(report.stats.submitted, 1);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.files[0].uuid.as_deref(), Some("abc-123"));
}

#[tokio::test]
async fn submit_sends_base64_filename_and_notify() {
    let d = dirs();
    write_pdf(&d.dir_in, "invoice.pdf");
    let api = FakeApi::default().accept("invoice.pdf", "abc-123");
    let config = SyncConfig::builder(&d.dir_out, "test-token")
        .dir_in(&d.dir_in)
        .notify_email("ops@example.com")
        .build()
        .unwrap();

    submit_pending(&api, &config).await.unwrap();

    let requests = api.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].filename, "invoice.pdf");
    assert_eq!(requests[0].notify.as_deref(), Some("ops@example.com"));
    assert_eq!(requests[0].file, "JVBERi0xLjQKJXRlc3QK");
}

#[tokio::test]
async fn failed_upload_leaves_file_pending_and_batch_continues() {
    let d = dirs();
    write_pdf(&d.dir_in, "a.pdf");
    write_pdf(&d.dir_in, "b.pdf");
    let api = FakeApi::default().accept("b.pdf", "uuid-b");

    let report = submit_pending(&api, &config(&d)).await.unwrap();

    // a.pdf failed: still pending, nothing created for it
    assert!(d.dir_in.join("a.pdf").is_file());
    assert!(!d.dir_in.join("Processed/a.pdf").exists());
    // b.pdf went through
    assert!(d.dir_in.join("Processed/b.pdf").is_file());
    assert!(d.dir_out.join("uuid-b").is_dir());

    assert_eq!(report.stats.total_files, 2);
    assert_eq!(report.stats.submitted, 1);
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.files[0].error,
        Some(ItemError::HttpStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn every_pdf_ends_up_exactly_once() {
    let d = dirs();
    let names = ["one.pdf", "two.pdf", "three.pdf", "four.pdf"];
    for n in names {
        write_pdf(&d.dir_in, n);
    }
    let api = FakeApi::default()
        .accept("one.pdf", "u1")
        .accept("three.pdf", "u3");

    submit_pending(&api, &config(&d)).await.unwrap();

    for n in names {
        let pending = d.dir_in.join(n).exists();
        let processed = d.dir_in.join("Processed").join(n).exists();
        assert!(pending ^ processed, "{n}: pending={pending} processed={processed}");
    }
    assert!(d.dir_out.join("u1").is_dir());
    assert!(d.dir_out.join("u3").is_dir());
    assert_eq!(fs::read_dir(&d.dir_out).unwrap().count(), 2);
}

#[tokio::test]
async fn submit_ignores_non_pdf_and_uppercase_suffix() {
    let d = dirs();
    write_pdf(&d.dir_in, "scan.PDF");
    fs::write(d.dir_in.join("notes.txt"), b"hi").unwrap();
    let api = FakeApi::default();

    let report = submit_pending(&api, &config(&d)).await.unwrap();

    assert_eq!(report.stats.total_files, 0);
    assert!(api.requests.lock().unwrap().is_empty());
    assert!(d.dir_in.join("scan.PDF").exists());
}

#[tokio::test]
async fn unsafe_job_id_keeps_file_pending() {
    let d = dirs();
    write_pdf(&d.dir_in, "invoice.pdf");
    let api = FakeApi::default().accept("invoice.pdf", "../escape");

    let report = submit_pending(&api, &config(&d)).await.unwrap();

    assert!(d.dir_in.join("invoice.pdf").is_file());
    assert!(!d.dir_out.parent().unwrap().join("escape").exists());
    assert!(matches!(
        report.files[0].error,
        Some(ItemError::InvalidJobId { .. })
    ));
}

#[tokio::test]
async fn submit_without_input_dir_is_fatal() {
    let d = dirs();
    let config = SyncConfig::builder(&d.dir_out, "tok").build().unwrap();
    let err = submit_pending(&FakeApi::default(), &config).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidConfig(_)));
}

#[tokio::test]
async fn unreadable_input_dir_is_fatal() {
    let d = dirs();
    let config = SyncConfig::builder(&d.dir_out, "tok")
        .dir_in(d.dir_in.join("missing"))
        .build()
        .unwrap();
    let err = submit_pending(&FakeApi::default(), &config).await.unwrap_err();
    assert!(matches!(err, SyncError::InputDirUnreadable { .. }));
}

// ── Collect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn collect_saves_result_under_reported_filename() {
    let d = dirs();
    fs::create_dir(d.dir_out.join("abc-123")).unwrap();
    let api = FakeApi::default()
        .status("abc-123", true, "invoice")
        .result("abc-123", serde_json::json!({"total": 42}));

    let report = collect_results(&api, &config(&d)).await.unwrap();

    let saved = fs::read_to_string(d.dir_out.join("invoice.json")).unwrap();
    assert_eq!(saved, "{\n  \"total\": 42\n}\n");
    assert!(!d.dir_out.join("abc-123").exists());
    assert!(!d.dir_out.join("abc-123.json").exists());
    assert_eq!(report.stats.collected, 1);
    assert!(matches!(
        report.jobs[0].outcome,
        CollectOutcome::Collected { ref result_path } if result_path.ends_with("invoice.json")
    ));
}

#[tokio::test]
async fn status_error_keeps_tracking_dir() {
    let d = dirs();
    fs::create_dir(d.dir_out.join("xyz-999")).unwrap();
    let api = FakeApi::default();

    let report = collect_results(&api, &config(&d)).await.unwrap();

    assert!(d.dir_out.join("xyz-999").is_dir());
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.jobs[0].outcome,
        CollectOutcome::Failed {
            error: ItemError::HttpStatus { status: 500, .. }
        }
    ));
    assert!(api.result_fetches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn status_error_is_logged_with_job_id() {
    let d = dirs();
    fs::create_dir(d.dir_out.join("xyz-999")).unwrap();
    let (logs, _guard) = capture_logs();

    collect_results(&FakeApi::default(), &config(&d)).await.unwrap();

    let logs = logs.contents();
    let error_line = logs
        .lines()
        .find(|l| l.contains("ERROR"))
        .unwrap_or_else(|| panic!("no error logged:\n{logs}"));
    assert!(error_line.contains("xyz-999"), "got: {error_line}");
    assert!(error_line.contains("500"), "got: {error_line}");
    assert!(
        logs.lines()
            .any(|l| l.contains("WARN") && l.contains("Job xyz-999 is not ready or failed.")),
        "got:\n{logs}"
    );
}

#[tokio::test]
async fn unsuccessful_job_is_left_for_next_run() {
    let d = dirs();
    fs::create_dir(d.dir_out.join("abc-123")).unwrap();
    let api = FakeApi::default().status("abc-123", false, "invoice");

    let report = collect_results(&api, &config(&d)).await.unwrap();

    assert!(d.dir_out.join("abc-123").is_dir());
    assert!(!d.dir_out.join("invoice.json").exists());
    assert_eq!(report.stats.not_ready, 1);
    assert!(api.result_fetches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn result_fetch_failure_keeps_tracking_dir() {
    let d = dirs();
    fs::create_dir(d.dir_out.join("abc-123")).unwrap();
    let api = FakeApi::default().status("abc-123", true, "invoice");

    let report = collect_results(&api, &config(&d)).await.unwrap();

    assert!(d.dir_out.join("abc-123").is_dir());
    assert!(!d.dir_out.join("invoice.json").exists());
    assert_eq!(report.stats.failed, 1);
}

#[tokio::test]
async fn tracking_dir_removed_iff_status_reports_success() {
    let d = dirs();
    for uuid in ["done-1", "busy-2", "broken-3", "done-4"] {
        fs::create_dir(d.dir_out.join(uuid)).unwrap();
    }
    let api = FakeApi::default()
        .status("done-1", true, "first")
        .status("busy-2", false, "second")
        .status("done-4", true, "fourth")
        .result("done-1", serde_json::json!({"n": 1}))
        .result("done-4", serde_json::json!({"n": 4}));

    let report = collect_results(&api, &config(&d)).await.unwrap();

    assert!(!d.dir_out.join("done-1").exists());
    assert!(d.dir_out.join("busy-2").is_dir());
    assert!(d.dir_out.join("broken-3").is_dir());
    assert!(!d.dir_out.join("done-4").exists());
    assert!(d.dir_out.join("first.json").is_file());
    assert!(d.dir_out.join("fourth.json").is_file());
    assert_eq!(report.stats.total_jobs, 4);
    assert_eq!(report.stats.collected, 2);
    assert_eq!(report.stats.not_ready, 1);
    assert_eq!(report.stats.failed, 1);
}

#[tokio::test]
async fn collect_twice_is_idempotent() {
    let d = dirs();
    fs::create_dir(d.dir_out.join("abc-123")).unwrap();
    fs::create_dir(d.dir_out.join("busy-2")).unwrap();
    let api = FakeApi::default()
        .status("abc-123", true, "invoice")
        .status("busy-2", false, "later")
        .result("abc-123", serde_json::json!({"total": 42}));
    let config = config(&d);

    collect_results(&api, &config).await.unwrap();
    let second = collect_results(&api, &config).await.unwrap();

    // Only the still-pending job is seen the second time round.
    assert_eq!(second.stats.total_jobs, 1);
    assert_eq!(second.stats.not_ready, 1);
    assert!(d.dir_out.join("busy-2").is_dir());
    assert_eq!(api.result_fetches.lock().unwrap().as_slice(), ["abc-123"]);

    let mut names: Vec<_> = fs::read_dir(&d.dir_out)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["busy-2", "invoice.json"]);
}

#[tokio::test]
async fn collect_ignores_result_files() {
    let d = dirs();
    fs::write(d.dir_out.join("invoice.json"), b"{}").unwrap();
    let api = FakeApi::default();

    let report = collect_results(&api, &config(&d)).await.unwrap();
    assert_eq!(report.stats.total_jobs, 0);
}

#[tokio::test]
async fn collect_does_not_need_input_dir() {
    let d = dirs();
    let config = SyncConfig::builder(&d.dir_out, "tok").build().unwrap();
    let report = collect_results(&FakeApi::default(), &config).await.unwrap();
    assert_eq!(report.stats.total_jobs, 0);
}

#[tokio::test]
async fn unreadable_output_dir_is_fatal() {
    let d = dirs();
    let config = SyncConfig::builder(d.dir_out.join("missing"), "tok")
        .build()
        .unwrap();
    let err = collect_results(&FakeApi::default(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::OutputDirUnreadable { .. }));
}

// ── End to end ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_then_collect() {
    let d = dirs();
    write_pdf(&d.dir_in, "invoice.pdf");
    let api = FakeApi::default()
        .accept("invoice.pdf", "abc-123")
        .result("abc-123", serde_json::json!({"rows": [1, 2]}));
    let config = config(&d);

    submit_pending(&api, &config).await.unwrap();

    // Not finished yet: first collect leaves the marker alone.
    api.statuses.lock().unwrap().insert(
        "abc-123".into(),
        JobStatus {
            success: false,
            processing: Some(true),
            ..JobStatus::default()
        },
    );
    collect_results(&api, &config).await.unwrap();
    assert!(d.dir_out.join("abc-123").is_dir());

    // Finished: second collect saves and cleans up.
    api.statuses.lock().unwrap().insert(
        "abc-123".into(),
        JobStatus {
            uuid: Some("abc-123".into()),
            success: true,
            filename: "invoice.pdf".into(),
            ..JobStatus::default()
        },
    );
    collect_results(&api, &config).await.unwrap();
    assert!(!d.dir_out.join("abc-123").exists());
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(d.dir_out.join("invoice.pdf.json")).unwrap())
            .unwrap();
    assert_eq!(saved, serde_json::json!({"rows": [1, 2]}));
}
