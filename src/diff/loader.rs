use super::model::DiffResponse;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Compute SHA-256 hash of a raw response (for reload change detection)
pub fn compute_response_hash(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn parse_response(raw: &str) -> Result<DiffResponse> {
    let response: DiffResponse =
        serde_json::from_str(raw).context("Failed to parse diff response")?;
    Ok(response)
}

/// Read and parse a response file. Returns the response and the hash of its raw content.
pub fn load_response(path: &Path) -> Result<(DiffResponse, String)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let response = parse_response(&raw).with_context(|| format!("In {}", path.display()))?;
    log::debug!("loaded {} diff lines from {}", response.diff.len(), path.display());
    Ok((response, compute_response_hash(&raw)))
}
