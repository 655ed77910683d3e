//! Configuration module
//!
//! Read-only settings for the sync engine: where KBs live, wiki
//! credentials, web fetch options and the summarizer command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment overrides for wiki credentials
pub const ENV_BASE_URL: &str = "CONFLUENCE_BASE_URL";
pub const ENV_USERNAME: &str = "CONFLUENCE_USERNAME";
pub const ENV_API_TOKEN: &str = "CONFLUENCE_API_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub confluence: ConfluenceConfig,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per knowledge base
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Wiki connection settings; all three fields are required for any wiki call
#[derive(Debug, Clone, Deserialize)]
pub struct ConfluenceConfig {
    /// Site URL (e.g., "https://acme.atlassian.net")
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; kbsync/{}; +documentation-sync)",
        env!("CARGO_PKG_VERSION")
    )
}

/// External LLM command; an empty command disables summarization
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_command")]
    pub command: Option<String>,

    #[serde(default = "default_summarizer_args")]
    pub args: Vec<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            command: default_summarizer_command(),
            args: default_summarizer_args(),
        }
    }
}

fn default_summarizer_command() -> Option<String> {
    Some("claude".to_string())
}

fn default_summarizer_args() -> Vec<String> {
    vec!["-p".to_string()]
}

impl Config {
    /// Load config from default locations, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load config from an explicit path, then apply env overrides
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let mut config = Self::load_from(path)?;
                config.apply_env();
                Ok(config)
            }
            None => Self::load(),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Local `.kbsync/config.toml` (walking up), else the global one
    fn find_config_file() -> Option<PathBuf> {
        if let Some(local) = Self::find_local_config() {
            return Some(local);
        }
        Self::global_config_path().filter(|p| p.exists())
    }

    /// Find local .kbsync/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(".kbsync").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config path (~/.kbsync/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".kbsync").join("config.toml"))
    }

    /// Directory holding knowledge bases
    ///
    /// Priority: `storage.root`, then `~/.kbsync/knowledge`, then `./knowledge`.
    pub fn storage_root(&self) -> PathBuf {
        if let Some(root) = &self.storage.root {
            return root.clone();
        }

        home_dir()
            .map(|h| h.join(".kbsync").join("knowledge"))
            .unwrap_or_else(|| PathBuf::from("knowledge"))
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.confluence.base_url = Some(url);
        }
        if let Some(user) = non_empty(ENV_USERNAME) {
            self.confluence.username = Some(user);
        }
        if let Some(token) = non_empty(ENV_API_TOKEN) {
            self.confluence.api_token = Some(token);
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    directories::UserDirs::new().map(|u| u.home_dir().to_path_buf())
}
