//! Client manifest parsing
// (c) 2026 Ferry contributors
//!
//! A manifest lists the files to fetch, one per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! report.pdf
//! logs/today.log    CRITICAL
//! photos/cat.jpg    high
//! ```
//!
//! A line holding only a path fetches it at `NORMAL` priority; paths may contain spaces.
//! The last word on a line is taken as the priority when it names one, case-insensitively.
//! A line ending in an unrecognised upper-case word (`report.pdf URGENT`) is skipped with a warning;
//! any other last word is part of the path.

use std::path::Path;
use std::str::FromStr as _;

use anyhow::Context as _;
use tracing::warn;

use super::{Priority, TransferRequest};

fn parse_line(line: &str) -> Option<TransferRequest> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let Some((path, label)) = line.rsplit_once(char::is_whitespace) else {
        return Some(TransferRequest::new(line, Priority::default()));
    };
    let path = path.trim_end();
    match Priority::from_str(label) {
        Ok(priority) => Some(TransferRequest::new(path, priority)),
        Err(_) if looks_like_priority(label) => {
            warn!("Unknown priority '{label}' for file {path}; skipping");
            None
        }
        Err(_) => Some(TransferRequest::new(line, Priority::default())),
    }
}

fn looks_like_priority(label: &str) -> bool {
    label.bytes().all(|b| b.is_ascii_uppercase())
}

/// Parses manifest text into requests, in manifest order
#[must_use]
pub fn parse_manifest(text: &str) -> Vec<TransferRequest> {
    text.lines().filter_map(parse_line).collect()
}

/// Reads and parses a manifest file
pub async fn read_manifest(path: &Path) -> anyhow::Result<Vec<TransferRequest>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    Ok(parse_manifest(&text))
}
