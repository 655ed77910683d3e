//! Content store - markdown files inside a KB directory
//!
//! Each fetched page or URL is written to `<kb>/<sanitized-title>.md`.
//! Files are re-derivable from a fresh fetch, so same-named files are
//! simply overwritten.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::error::SyncResult;

/// Maximum file stem length in characters
pub const MAX_FILENAME_CHARS: usize = 200;

const FALLBACK_FILENAME: &str = "untitled";

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x08\x0b\x0c\x0e-\x1f]"#).expect("valid regex"));
static WHITESPACE_OR_HYPHENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("valid regex"));

/// Turn a document title into a safe file stem
pub fn sanitize_filename(title: &str) -> String {
    let stripped = INVALID_CHARS.replace_all(title, "");
    let collapsed = WHITESPACE_OR_HYPHENS.replace_all(stripped.trim(), "-");
    let truncated: String = collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();
    let name = truncated.trim_end_matches('-').trim_start_matches('.');

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name.to_string()
    }
}

/// Writes fetched content under the storage root
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a document with this title would be written to
    pub fn path_for(&self, kb: &str, title: &str) -> PathBuf {
        self.root
            .join(kb)
            .join(format!("{}.md", sanitize_filename(title)))
    }

    /// Write `content` for `title`, replacing any existing file
    pub fn store(&self, kb: &str, title: &str, content: &str) -> SyncResult<PathBuf> {
        let path = self.path_for(kb, title);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        debug!(path = %path.display(), bytes = content.len(), "Stored content");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_strips_invalid_chars() {
        assert_eq!(sanitize_filename("Ops: What/Why?"), "Ops-WhatWhy");
        assert_eq!(sanitize_filename(r#"a<b>c|d"e*f\g"#), "abcdefg");
    }

    #[test]
    fn test_sanitize_collapses_whitespace_and_hyphens() {
        assert_eq!(sanitize_filename("  Deploy   -- Guide  "), "Deploy-Guide");
        assert_eq!(sanitize_filename("On-call\tRunbook"), "On-call-Runbook");
        assert_eq!(sanitize_filename("Release\r\nNotes"), "Release-Notes");
    }

    #[test]
    fn test_sanitize_drops_other_control_chars() {
        assert_eq!(sanitize_filename("Bell\x07Tower\x1b"), "BellTower");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn test_sanitize_fallback() {
        assert_eq!(sanitize_filename(""), "untitled");
        assert_eq!(sanitize_filename("///???"), "untitled");
        assert_eq!(sanitize_filename(" - - "), "untitled");
    }

    #[test]
    fn test_store_overwrites_same_title() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = ContentStore::new(dir.path());

        let first = store.store("infra", "Deploy Guide", "v1")?;
        let second = store.store("infra", "Deploy  Guide", "v2")?;

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("infra").join("Deploy-Guide.md"));
        assert_eq!(fs::read_to_string(&second)?, "v2");
        Ok(())
    }
}
