//! kbsync - documentation sync into local knowledge bases
//!
//! Pulls wiki pages (by label) and web pages into per-KB directories of
//! Markdown files, each described by a `manifest.json`.
//!
//! ## Key Concepts
//!
//! - **Manifest-driven**: a KB's manifest lists its sources; refresh replays them
//! - **Checksum-gated summaries**: unchanged content never reaches the summarizer
//! - **Merge by type**: refreshing one source type leaves the others untouched
//! - **Label discovery**: a KB without a manifest is bootstrapped from the
//!   wiki label of the same name

pub mod cli;
pub mod config;
pub mod core;
pub mod remote;

pub use config::Config;
pub use core::error::{SyncError, SyncResult};
pub use core::manifest::{KbType, Manifest, ManifestStore, PageEntry, Source, SourceKind, UrlEntry};
pub use core::summarizer::Summarizer;
pub use core::sync::{BatchReport, KbSummary, RefreshMode, RefreshReport, SyncEngine};
pub use remote::{ConfluenceApi, ConfluenceClient, HttpFetcher, WebFetcher};
