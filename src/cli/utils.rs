//! CLI utility functions
//!
//! Shared setup for commands: config resolution and engine construction.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::core::manifest::ManifestStore;
use crate::core::summarizer::{self, Summarizer};
use crate::core::sync::SyncEngine;
use crate::remote::{ConfluenceClient, HttpFetcher};

/// Engine wired to the real wiki, web and summarizer
pub type Engine = SyncEngine<ConfluenceClient, HttpFetcher, Box<dyn Summarizer>>;

/// Resolved settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub root: PathBuf,
}

impl Context {
    /// Load config (explicit path first) and resolve the storage root
    pub fn load(config_path: Option<&Path>, root: Option<PathBuf>) -> Result<Self> {
        let config = Config::load_with(config_path)?;
        let root = root.unwrap_or_else(|| config.storage_root());
        Ok(Self { config, root })
    }

    pub fn store(&self) -> ManifestStore {
        ManifestStore::new(&self.root)
    }

    /// Build a sync engine; wiki credentials are checked lazily per request
    pub fn engine(&self) -> Result<Engine> {
        let confluence = ConfluenceClient::new(&self.config.confluence)
            .context("Failed to create wiki client")?;
        let web = HttpFetcher::new(&self.config.web).context("Failed to create web client")?;
        let summarizer = summarizer::from_config(&self.config.summarizer);

        Ok(SyncEngine::new(self.store(), confluence, web, summarizer))
    }
}
