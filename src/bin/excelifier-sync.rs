//! CLI binary for excelifier-sync.
//!
//! A thin shim over the library crate that maps flags and environment
//! variables to `SyncConfig`, runs the requested job and prints a summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use excelifier_sync::{
    collect_results, submit_pending, CollectReport, HttpJobApi, SubmitReport, SyncConfig,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload every PDF in DIR_IN
  excelifier-sync submit

  # Download finished results into DIR_OUT
  excelifier-sync collect

  # Both, e.g. from cron every 10 minutes
  */10 * * * *  excelifier-sync run

  # Machine-readable report
  excelifier-sync --json collect > report.json

DIRECTORY LAYOUT:
  DIR_IN/*.pdf             pending input files
  DIR_IN/Processed/*.pdf   submitted input files
  DIR_OUT/<uuid>/          empty marker for an in-flight job
  DIR_OUT/<filename>.json  collected result

ENVIRONMENT VARIABLES:
  DIR_IN                   Input directory (submit only)
  DIR_OUT                  Output directory
  BEARER_TOKEN             Excelifier API token
  NOTIFY_EMAIL             Address notified when a job finishes (optional)
  EXCELIFIER_API_URL       API root (default: https://api.excelifier.com)
  EXCELIFIER_TIMEOUT_SECS  Per-request timeout (default: none)
  RUST_LOG                 Log filter, overrides -v / -q
"#;

/// Submit PDFs to Excelifier and collect the JSON results.
#[derive(Parser, Debug)]
#[command(
    name = "excelifier-sync",
    version,
    about = "Submit PDFs to Excelifier and collect the JSON results",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory scanned for pending .pdf files.
    #[arg(long, global = true, env = "DIR_IN")]
    dir_in: Option<PathBuf>,

    /// Directory for tracking directories and JSON results.
    #[arg(long, global = true, env = "DIR_OUT")]
    dir_out: Option<PathBuf>,

    /// Bearer token for the Excelifier API.
    #[arg(long, global = true, env = "BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,

    /// Email address notified when a job finishes.
    #[arg(long, global = true, env = "NOTIFY_EMAIL")]
    notify_email: Option<String>,

    /// API root URL.
    #[arg(long, global = true, env = "EXCELIFIER_API_URL")]
    api_url: Option<String>,

    /// Per-request timeout in seconds. Unset means wait indefinitely.
    #[arg(long, global = true, env = "EXCELIFIER_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Print the run report as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Upload pending PDFs and move them to Processed/.
    Submit,
    /// Fetch results for finished jobs and remove their tracking directories.
    Collect,
    /// Submit, then collect.
    Run,
}

#[derive(serde::Serialize)]
struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    submit: Option<SubmitReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collect: Option<CollectReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    tracing::debug!("{:?}", config);
    let api = HttpJobApi::new(&config).context("Failed to set up the API client")?;

    // ── Run jobs ─────────────────────────────────────────────────────────
    let mut report = RunReport {
        submit: None,
        collect: None,
    };

    if matches!(cli.command, Command::Submit | Command::Run) {
        let r = submit_pending(&api, &config)
            .await
            .context("Submit run failed")?;
        if !cli.quiet && !cli.json {
            print_submit_summary(&r);
        }
        report.submit = Some(r);
    }

    if matches!(cli.command, Command::Collect | Command::Run) {
        let r = collect_results(&api, &config)
            .await
            .context("Collect run failed")?;
        if !cli.quiet && !cli.json {
            print_collect_summary(&r);
        }
        report.collect = Some(r);
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `SyncConfig`.
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let dir_out = cli
        .dir_out
        .clone()
        .context("DIR_OUT is not set (use --dir-out or the DIR_OUT env var)")?;
    let token = cli
        .bearer_token
        .clone()
        .context("BEARER_TOKEN is not set (use --bearer-token or the BEARER_TOKEN env var)")?;

    let mut builder = SyncConfig::builder(dir_out, token);
    if let Some(ref dir_in) = cli.dir_in {
        builder = builder.dir_in(dir_in);
    } else if cli.command != Command::Collect {
        anyhow::bail!("DIR_IN is not set (use --dir-in or the DIR_IN env var)");
    }
    if let Some(ref email) = cli.notify_email {
        builder = builder.notify_email(email);
    }
    if let Some(ref url) = cli.api_url {
        builder = builder.api_base_url(url);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}

fn print_submit_summary(report: &SubmitReport) {
    let s = &report.stats;
    eprintln!(
        "{}  submit: {}/{} files sent  {}",
        if s.failed == 0 { green("✔") } else { cyan("⚠") },
        s.submitted,
        s.total_files,
        dim(&format!("{}ms", s.duration_ms)),
    );
    for file in report.files.iter().filter(|f| f.error.is_some()) {
        if let Some(ref e) = file.error {
            eprintln!("   {} {}", file.file_name, dim(&e.to_string()));
        }
    }
}

fn print_collect_summary(report: &CollectReport) {
    let s = &report.stats;
    eprintln!(
        "{}  collect: {}/{} collected, {} not ready, {} failed  {}",
        if s.failed == 0 { green("✔") } else { cyan("⚠") },
        s.collected,
        s.total_jobs,
        s.not_ready,
        s.failed,
        dim(&format!("{}ms", s.duration_ms)),
    );
}
