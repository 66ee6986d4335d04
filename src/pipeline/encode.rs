//! File encoding: PDF bytes → standard base64 for the `POST /job` body.
//!
//! The API takes the whole document inline as a JSON string, so the file is
//! read fully into memory. Padding is kept (`STANDARD`, not `STANDARD_NO_PAD`).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Encode raw bytes as standard, padded base64.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Read `path` and return its contents as base64.
pub async fn encode_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let b64 = encode_bytes(&bytes);
    debug!(
        "Encoded {} → {} bytes base64 ({} raw)",
        path.display(),
        b64.len(),
        bytes.len()
    );
    Ok(b64)
}
