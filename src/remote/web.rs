//! Web source - fetch arbitrary documentation pages
//!
//! Only the given URL is fetched; links are never followed.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::config::WebConfig;
use crate::core::error::{SyncError, SyncResult};

/// Redirect hops followed before giving up
pub const MAX_REDIRECTS: usize = 10;

/// Fetches raw hypertext for a URL
pub trait WebFetcher {
    fn fetch(&self, url: &Url) -> SyncResult<String>;
}

impl<T: WebFetcher + ?Sized> WebFetcher for &T {
    fn fetch(&self, url: &Url) -> SyncResult<String> {
        (**self).fetch(url)
    }
}

/// Accept only http(s) URLs with a non-empty host
pub fn validate_url(raw: &str) -> SyncResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| SyncError::validation(format!("invalid URL '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SyncError::validation(format!(
            "unsupported URL scheme '{}' in '{}' (expected http or https)",
            url.scheme(),
            raw
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(SyncError::validation(format!("URL '{}' has no host", raw)));
    }

    Ok(url)
}

/// Blocking HTTP fetcher with redirects, a fixed user agent and a timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &WebConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SyncError::remote("create HTTP client", e.to_string()))?;

        Ok(Self { client })
    }
}

impl WebFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> SyncResult<String> {
        let operation = format!("fetch {}", url);
        debug!(url = %url, "Fetching web page");

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| SyncError::remote(&operation, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::remote(
                &operation,
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("request failed")
                ),
            ));
        }

        response
            .text()
            .map_err(|e| SyncError::remote(&operation, e.to_string()))
    }
}
