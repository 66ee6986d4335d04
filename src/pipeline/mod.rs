//! Local building blocks shared by the submit and collect jobs.
//!
//! Each submodule covers one kind of local work. None of them touch the
//! network; that is confined to [`crate::api`].
//!
//! ## Data Flow
//!
//! ```text
//! submit:   scan::pending_pdfs ──▶ encode ──▶ api::create_job ──▶ fs_ops::{ensure_dir, move_file}
//! collect:  scan::tracking_dirs ──▶ api::job_status ──▶ api::job_result ──▶ fs_ops::{write_json, remove_tracking_dir}
//! ```
//!
//! 1. [`scan`]   — list pending PDFs and in-flight tracking directories
//! 2. [`encode`] — read a PDF and base64-wrap it for the request body
//! 3. [`fs_ops`] — the idempotent mkdir, move, write and remove steps

pub mod encode;
pub mod fs_ops;
pub mod scan;
