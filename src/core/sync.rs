//! Sync - manifest-driven refresh of knowledge bases
//!
//! # Flow
//!
//! ```text
//! refresh(kb)
//!   ├─ manifest exists ──▶ replay each source type
//!   │     confluence: label ─▶ pages ─▶ markdown ─▶ summary cache ─▶ .md files
//!   │     web:        urls  ─▶ html  ─▶ markdown ─▶ title + summary ─▶ .md files
//!   │     merge fresh sources by type ─▶ ManifestStore::update
//!   └─ no manifest ──────▶ KB name as label ─▶ pages ─▶ ManifestStore::create
//! ```
//!
//! Everything runs sequentially on the calling thread. Nothing is retried.

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use super::checksum::checksum;
use super::content_store::ContentStore;
use super::error::{SyncError, SyncResult};
use super::manifest::{
    merge_by_type, validate_kb_name, KbType, Manifest, ManifestStore, PageEntry, Source,
    SourceKind, UrlEntry,
};
use super::summarizer::Summarizer;
use super::summary::SummaryCache;
use super::title::infer_title;
use super::transform::{html_to_markdown, web_to_markdown};
use crate::remote::confluence::{fetch_by_label, ConfluenceApi, FetchedPage};
use crate::remote::web::{validate_url, WebFetcher};

/// How a refresh was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Sources replayed from an existing manifest
    ManifestAware,
    /// No manifest: the KB name was resolved as a label and a manifest created
    LabelDiscovery,
    /// No manifest and nothing to discover; nothing was written
    NoSources,
}

/// Outcome of refreshing one KB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub kb: String,
    pub mode: RefreshMode,
    pub pages: usize,
    pub urls: usize,
    pub summaries_generated: usize,
    pub summaries_reused: usize,
}

impl RefreshReport {
    fn new(kb: &str, mode: RefreshMode) -> Self {
        Self {
            kb: kb.to_string(),
            mode,
            pages: 0,
            urls: 0,
            summaries_generated: 0,
            summaries_reused: 0,
        }
    }

    fn record(&mut self, generated: bool, reused: bool) {
        if generated {
            self.summaries_generated += 1;
        }
        if reused {
            self.summaries_reused += 1;
        }
    }
}

/// A KB that failed during `refresh_all`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KbFailure {
    pub kb: String,
    pub message: String,
}

/// Aggregate outcome of `refresh_all`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_pages: usize,
    pub failures: Vec<KbFailure>,
}

/// One line of `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KbSummary {
    pub name: String,
    pub kb_type: KbType,
    pub pages: usize,
    pub urls: usize,
}

/// Coordinates discovery, fetch, transform, summarization and storage
pub struct SyncEngine<C, W, S> {
    manifests: ManifestStore,
    content: ContentStore,
    confluence: C,
    web: W,
    summaries: SummaryCache<S>,
}

impl<C, W, S> SyncEngine<C, W, S>
where
    C: ConfluenceApi,
    W: WebFetcher,
    S: Summarizer,
{
    pub fn new(manifests: ManifestStore, confluence: C, web: W, summarizer: S) -> Self {
        let content = ContentStore::new(manifests.root());
        Self {
            manifests,
            content,
            confluence,
            web,
            summaries: SummaryCache::new(summarizer),
        }
    }

    pub fn manifests(&self) -> &ManifestStore {
        &self.manifests
    }

    /// Refresh every source of a KB
    pub fn refresh(&self, kb: &str) -> SyncResult<RefreshReport> {
        self.refresh_scoped(kb, None)
    }

    /// Refresh a KB, optionally limited to one source type
    ///
    /// Source types outside `only` are written back unchanged.
    pub fn refresh_scoped(&self, kb: &str, only: Option<SourceKind>) -> SyncResult<RefreshReport> {
        validate_kb_name(kb)?;

        match self.manifests.read(kb) {
            Some(manifest) => self.refresh_from_manifest(kb, &manifest, only),
            None if only == Some(SourceKind::Web) => {
                warn!(kb, "No manifest and no web sources to refresh");
                Ok(RefreshReport::new(kb, RefreshMode::NoSources))
            }
            None => self.discover_from_label(kb),
        }
    }

    fn refresh_from_manifest(
        &self,
        kb: &str,
        manifest: &Manifest,
        only: Option<SourceKind>,
    ) -> SyncResult<RefreshReport> {
        let mut report = RefreshReport::new(kb, RefreshMode::ManifestAware);
        let mut fresh = Vec::new();

        for source in &manifest.sources {
            if only.is_some_and(|kind| kind != source.kind()) {
                continue;
            }

            match source {
                Source::Confluence { label, pages } => {
                    let label_name = label.as_deref().unwrap_or(kb);
                    match fetch_by_label(&self.confluence, label_name)? {
                        Some(fetched) => {
                            let pages = self.sync_pages(kb, fetched, pages, &mut report)?;
                            fresh.push(Source::Confluence {
                                label: label.clone(),
                                pages,
                            });
                        }
                        None => {
                            warn!(kb, label = label_name, "Label not found, keeping stored pages");
                            fresh.push(source.clone());
                        }
                    }
                }
                Source::Web { urls } => {
                    let mut refreshed = Vec::with_capacity(urls.len());
                    for entry in urls {
                        let (entry, generated, reused) = self.sync_url(kb, &entry.url, Some(entry))?;
                        report.record(generated, reused);
                        report.urls += 1;
                        refreshed.push(entry);
                    }
                    fresh.push(Source::Web { urls: refreshed });
                }
            }
        }

        let merged = merge_by_type(&manifest.sources, fresh);
        self.manifests.update(kb, merged, None)?;

        info!(
            kb,
            pages = report.pages,
            urls = report.urls,
            generated = report.summaries_generated,
            reused = report.summaries_reused,
            "Refreshed knowledge base"
        );
        Ok(report)
    }

    fn discover_from_label(&self, kb: &str) -> SyncResult<RefreshReport> {
        let Some(fetched) = fetch_by_label(&self.confluence, kb)? else {
            warn!(kb, "No manifest and no label matching the KB name");
            return Ok(RefreshReport::new(kb, RefreshMode::NoSources));
        };

        let mut report = RefreshReport::new(kb, RefreshMode::LabelDiscovery);
        let pages = self.sync_pages(kb, fetched, &[], &mut report)?;
        self.manifests.create(
            kb,
            vec![Source::Confluence { label: None, pages }],
            KbType::Local,
        )?;

        info!(kb, pages = report.pages, "Created knowledge base from label");
        Ok(report)
    }

    fn sync_pages(
        &self,
        kb: &str,
        fetched: Vec<FetchedPage>,
        previous: &[PageEntry],
        report: &mut RefreshReport,
    ) -> SyncResult<Vec<PageEntry>> {
        let mut entries = Vec::with_capacity(fetched.len());

        for page in fetched {
            let markdown = page
                .body
                .as_deref()
                .map(html_to_markdown)
                .unwrap_or_default();
            let title = Some(page.title.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            let prior = previous
                .iter()
                .find(|p| p.id == page.id)
                .map(|p| (p.content_checksum.as_deref(), p.summary.as_str()));
            let outcome = self.summaries.summarize(&markdown, title.as_deref(), prior);
            report.record(outcome.generated, outcome.reused);

            self.content
                .store(kb, title.as_deref().unwrap_or_default(), &markdown)?;

            entries.push(PageEntry {
                id: page.id,
                title,
                summary: outcome.summary,
                content_checksum: outcome.checksum,
            });
            report.pages += 1;
        }

        Ok(entries)
    }

    /// Fetch one URL into the KB; returns the entry and (generated, reused) flags
    fn sync_url(
        &self,
        kb: &str,
        raw_url: &str,
        previous: Option<&UrlEntry>,
    ) -> SyncResult<(UrlEntry, bool, bool)> {
        let url = validate_url(raw_url)?;
        let html = self.web.fetch(&url)?;
        let markdown = web_to_markdown(&html);
        let content_checksum = checksum(Some(&markdown));

        let cached = previous.filter(|p| {
            p.content_checksum.is_some() && p.content_checksum == content_checksum && p.title.is_some()
        });

        let (title, summary, generated, reused) = match cached {
            Some(prev) => (
                prev.title.clone().unwrap_or_default(),
                prev.summary.clone(),
                false,
                true,
            ),
            None => {
                let title = infer_title(&html, &markdown, url.as_str(), self.summaries.summarizer());
                let outcome = self.summaries.summarize(&markdown, Some(&title), None);
                (title, outcome.summary, outcome.generated, false)
            }
        };

        self.content.store(kb, &title, &markdown)?;

        let entry = UrlEntry {
            url: raw_url.to_string(),
            title: Some(title),
            summary,
            last_fetched: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            content_checksum,
        };
        Ok((entry, generated, reused))
    }

    /// Fetch a single URL and append it to the KB's web source
    ///
    /// No de-duplication: adding a URL twice records it twice. Confluence
    /// sources are left untouched.
    pub fn add_url(&self, kb: &str, url: &str) -> SyncResult<UrlEntry> {
        validate_kb_name(kb)?;
        validate_url(url)?;

        let (entry, _, _) = self.sync_url(kb, url, None)?;

        let mut sources = self.manifests.sources_of(kb);
        let web_urls = sources.iter_mut().find_map(|source| match source {
            Source::Web { urls } => Some(urls),
            Source::Confluence { .. } => None,
        });
        match web_urls {
            Some(urls) => urls.push(entry.clone()),
            None => sources.push(Source::Web {
                urls: vec![entry.clone()],
            }),
        }

        self.manifests.update(kb, sources, None)?;
        info!(kb, url, "Added URL");
        Ok(entry)
    }

    /// Refresh every KB with a manifest, one at a time
    ///
    /// Every per-KB failure, configuration errors included, is recorded
    /// and the batch moves on to the next KB.
    pub fn refresh_all(&self) -> SyncResult<BatchReport> {
        let mut batch = BatchReport::default();

        for kb in self.manifests.list()? {
            batch.attempted += 1;

            let result = match self.manifests.read(&kb) {
                Some(manifest) => self.refresh_from_manifest(&kb, &manifest, None),
                None => Err(SyncError::validation("manifest is missing or invalid")),
            };

            match result {
                Ok(report) => {
                    batch.succeeded += 1;
                    batch.total_pages += report.pages;
                }
                Err(e) => {
                    warn!(kb = %kb, error = %e, "Refresh failed");
                    batch.failed += 1;
                    batch.failures.push(KbFailure {
                        kb,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            attempted = batch.attempted,
            succeeded = batch.succeeded,
            failed = batch.failed,
            "Refreshed all knowledge bases"
        );
        Ok(batch)
    }

    /// Known KBs with readable manifests
    pub fn list(&self) -> SyncResult<Vec<KbSummary>> {
        let mut summaries = Vec::new();
        for name in self.manifests.list()? {
            match self.manifests.read(&name) {
                Some(manifest) => summaries.push(KbSummary {
                    pages: manifest.page_count(),
                    urls: manifest.url_count(),
                    kb_type: manifest.kb_type,
                    name,
                }),
                None => warn!(kb = %name, "Skipping KB with unreadable manifest"),
            }
        }
        Ok(summaries)
    }
}
