//! Manifest - per-KB JSON record of sources
//!
//! Each knowledge base directory holds one `manifest.json`:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "name": "infra",
//!   "kb_type": "local",
//!   "sources": [
//!     { "type": "confluence", "label": "infra", "pages": [ ... ] },
//!     { "type": "web", "urls": [ ... ] }
//!   ]
//! }
//! ```
//!
//! # Key Points
//! - Writes validate structure and fail with `SyncError::Validation`
//! - Reads never fail: malformed files are logged and treated as absent
//! - `update` replaces the whole `sources` array; callers merge by type
//!   first (see [`merge_by_type`])
//! - No locking, last write wins

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{SyncError, SyncResult};

/// Supported manifest schema version
pub const MANIFEST_VERSION: &str = "1.0";

/// Manifest file name inside a KB directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Where a knowledge base lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KbType {
    #[default]
    Local,
    Remote,
}

impl fmt::Display for KbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KbType::Local => write!(f, "local"),
            KbType::Remote => write!(f, "remote"),
        }
    }
}

/// A wiki page synced into the KB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_checksum: Option<String>,
}

/// A web page synced into the KB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fetched: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_checksum: Option<String>,
}

impl UrlEntry {
    pub fn new(url: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            summary: summary.into(),
            last_fetched: None,
            content_checksum: None,
        }
    }
}

/// One origin of documents for a KB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    Confluence {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        pages: Vec<PageEntry>,
    },
    Web {
        urls: Vec<UrlEntry>,
    },
}

/// Discriminant of [`Source`], used for merge-by-type and scoped refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Confluence,
    Web,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Confluence => write!(f, "confluence"),
            SourceKind::Web => write!(f, "web"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confluence" => Ok(SourceKind::Confluence),
            "web" => Ok(SourceKind::Web),
            _ => Err(SyncError::validation(format!("unknown source type '{}'", s))),
        }
    }
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Confluence { .. } => SourceKind::Confluence,
            Source::Web { .. } => SourceKind::Web,
        }
    }

    /// Number of documents this source contributes
    pub fn item_count(&self) -> usize {
        match self {
            Source::Confluence { pages, .. } => pages.len(),
            Source::Web { urls } => urls.len(),
        }
    }

    fn validate(&self, index: usize) -> SyncResult<()> {
        match self {
            Source::Confluence { pages, .. } => {
                for (i, page) in pages.iter().enumerate() {
                    if page.id.trim().is_empty() {
                        return Err(SyncError::validation(format!(
                            "sources[{}].pages[{}]: 'id' must not be empty",
                            index, i
                        )));
                    }
                }
            }
            Source::Web { urls } => {
                for (i, entry) in urls.iter().enumerate() {
                    if entry.url.trim().is_empty() {
                        return Err(SyncError::validation(format!(
                            "sources[{}].urls[{}]: 'url' must not be empty",
                            index, i
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// The JSON record of a KB's sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub kb_type: KbType,
    pub sources: Vec<Source>,
}

impl Manifest {
    pub fn new(name: &str, sources: Vec<Source>, kb_type: KbType) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            name: name.to_string(),
            kb_type,
            sources,
        }
    }

    /// Parse and validate manifest JSON
    pub fn from_json(raw: &str) -> SyncResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| SyncError::validation(format!("malformed JSON: {}", e)))?;

        let version = value.get("version").and_then(Value::as_str);
        if version != Some(MANIFEST_VERSION) {
            return Err(SyncError::validation(format!(
                "unsupported manifest version {:?} (expected {})",
                version, MANIFEST_VERSION
            )));
        }
        if value.get("name").and_then(Value::as_str).is_none() {
            return Err(SyncError::validation("missing 'name'"));
        }

        let sources = value
            .get("sources")
            .and_then(Value::as_array)
            .ok_or_else(|| SyncError::validation("missing 'sources' array"))?;
        for (index, source) in sources.iter().enumerate() {
            validate_source_value(index, source)?;
        }

        let manifest: Manifest = serde_json::from_value(value)
            .map_err(|e| SyncError::validation(e.to_string()))?;
        validate_sources(&manifest.sources)?;
        Ok(manifest)
    }

    pub fn page_count(&self) -> usize {
        self.count_of(SourceKind::Confluence)
    }

    pub fn url_count(&self) -> usize {
        self.count_of(SourceKind::Web)
    }

    fn count_of(&self, kind: SourceKind) -> usize {
        self.sources
            .iter()
            .filter(|s| s.kind() == kind)
            .map(Source::item_count)
            .sum()
    }
}

/// Validate typed sources before they are written
pub fn validate_sources(sources: &[Source]) -> SyncResult<()> {
    for (index, source) in sources.iter().enumerate() {
        source.validate(index)?;
    }
    Ok(())
}

/// Structural check of an untyped source object
///
/// Gives precise messages for hand-edited manifests before serde sees them.
pub fn validate_source_value(index: usize, source: &Value) -> SyncResult<()> {
    let kind = source
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::validation(format!("sources[{}]: missing 'type'", index)))?;

    let (list_key, required) = match kind {
        "confluence" => ("pages", ["id", "summary"]),
        "web" => ("urls", ["url", "summary"]),
        other => {
            return Err(SyncError::validation(format!(
                "sources[{}]: unknown source type '{}'",
                index, other
            )))
        }
    };

    let entries = source
        .get(list_key)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SyncError::validation(format!(
                "sources[{}]: {} source requires a '{}' array",
                index, kind, list_key
            ))
        })?;

    for (i, entry) in entries.iter().enumerate() {
        for field in required {
            if entry.get(field).and_then(Value::as_str).is_none() {
                return Err(SyncError::validation(format!(
                    "sources[{}].{}[{}]: missing '{}'",
                    index, list_key, i, field
                )));
            }
        }
    }

    Ok(())
}

/// Replace stored sources with fresh ones of the same kind
///
/// Kinds absent from `fresh` are carried through untouched, in place.
/// Fresh sources take the position of the first stored source of their
/// kind, or are appended when the kind is new.
pub fn merge_by_type(stored: &[Source], fresh: Vec<Source>) -> Vec<Source> {
    let fresh_kinds: Vec<SourceKind> = fresh.iter().map(Source::kind).collect();
    let mut pending: Vec<Option<Source>> = fresh.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(stored.len().max(pending.len()));

    for source in stored {
        let kind = source.kind();
        if !fresh_kinds.contains(&kind) {
            merged.push(source.clone());
            continue;
        }
        for (slot, slot_kind) in pending.iter_mut().zip(&fresh_kinds) {
            if *slot_kind == kind {
                if let Some(replacement) = slot.take() {
                    merged.push(replacement);
                }
            }
        }
    }

    merged.extend(pending.into_iter().flatten());
    merged
}

/// Reads and writes per-KB manifests under a storage root
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the KB's manifest and content files
    pub fn kb_dir(&self, kb: &str) -> PathBuf {
        self.root.join(kb)
    }

    pub fn manifest_path(&self, kb: &str) -> PathBuf {
        self.kb_dir(kb).join(MANIFEST_FILE)
    }

    pub fn exists(&self, kb: &str) -> bool {
        self.manifest_path(kb).is_file()
    }

    /// Read a manifest; malformed or mismatched files read as absent
    pub fn read(&self, kb: &str) -> Option<Manifest> {
        let path = self.manifest_path(kb);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read manifest");
                return None;
            }
        };

        match Manifest::from_json(&raw) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring invalid manifest");
                None
            }
        }
    }

    /// Sources recorded for a KB, empty when no manifest exists
    pub fn sources_of(&self, kb: &str) -> Vec<Source> {
        self.read(kb).map(|m| m.sources).unwrap_or_default()
    }

    /// Write a fresh manifest for a KB
    pub fn create(&self, kb: &str, sources: Vec<Source>, kb_type: KbType) -> SyncResult<Manifest> {
        validate_kb_name(kb)?;
        validate_sources(&sources)?;

        let manifest = Manifest::new(kb, sources, kb_type);
        self.write(&manifest)?;
        Ok(manifest)
    }

    /// Replace a KB's sources, keeping its kb_type unless overridden
    pub fn update(
        &self,
        kb: &str,
        sources: Vec<Source>,
        kb_type: Option<KbType>,
    ) -> SyncResult<Manifest> {
        validate_kb_name(kb)?;
        validate_sources(&sources)?;

        let kb_type = kb_type
            .or_else(|| self.read(kb).map(|m| m.kb_type))
            .unwrap_or_default();

        let manifest = Manifest::new(kb, sources, kb_type);
        self.write(&manifest)?;
        Ok(manifest)
    }

    /// Names of KB directories under the root holding a manifest file
    pub fn list(&self) -> SyncResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.exists(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn write(&self, manifest: &Manifest) -> SyncResult<()> {
        let dir = self.kb_dir(&manifest.name);
        fs::create_dir_all(&dir)?;

        let mut json = serde_json::to_string_pretty(manifest)
            .map_err(|e| SyncError::validation(e.to_string()))?;
        json.push('\n');

        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, json)?;
        debug!(path = %path.display(), sources = manifest.sources.len(), "Wrote manifest");
        Ok(())
    }
}

/// KB names become directory names, so they must be a single path segment
pub fn validate_kb_name(kb: &str) -> SyncResult<()> {
    let trimmed = kb.trim();
    if trimmed.is_empty() {
        return Err(SyncError::validation("knowledge base name must not be empty"));
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains('/') || trimmed.contains('\\') {
        return Err(SyncError::validation(format!(
            "invalid knowledge base name '{}'",
            kb
        )));
    }
    Ok(())
}
