//! Confluence source - label discovery and page fetch
//!
//! Discovery pages through the label search endpoint until an exact name
//! match turns up or the cursor runs out. Page fetch lists the pages under
//! a label and falls back to a per-page content request when a result has
//! no inline body.
//!
//! All requests use HTTP Basic auth. Missing credentials are rejected
//! before any request is made.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use super::types::{
    ContentResponse, LabelListResponse, LabelPage, PageListResponse, RemotePage,
};
use crate::config::{ConfluenceConfig, ENV_API_TOKEN, ENV_BASE_URL, ENV_USERNAME};
use crate::core::error::{SyncError, SyncResult};

/// Labels requested per discovery page
pub const LABEL_PAGE_SIZE: usize = 250;

/// Pages requested per label listing page
pub const PAGE_LIST_SIZE: usize = 100;

/// Label name prefix used to filter label search
pub const LABEL_PREFIX: &str = "global";

/// One page of pages listed under a label
#[derive(Debug, Clone, Default)]
pub struct PageBatch {
    pub pages: Vec<RemotePage>,
    pub next_cursor: Option<String>,
}

/// A wiki page with its storage-format body resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
}

/// Wiki REST operations the sync engine relies on
pub trait ConfluenceApi {
    /// One page of label search results
    fn search_labels(&self, cursor: Option<&str>) -> SyncResult<LabelPage>;

    /// One page of pages carrying a label, bodies inline where available
    fn label_pages(&self, label_id: &str, cursor: Option<&str>) -> SyncResult<PageBatch>;

    /// Storage-format body of a single page
    fn page_body(&self, page_id: &str) -> SyncResult<Option<String>>;
}

impl<T: ConfluenceApi + ?Sized> ConfluenceApi for &T {
    fn search_labels(&self, cursor: Option<&str>) -> SyncResult<LabelPage> {
        (**self).search_labels(cursor)
    }

    fn label_pages(&self, label_id: &str, cursor: Option<&str>) -> SyncResult<PageBatch> {
        (**self).label_pages(label_id, cursor)
    }

    fn page_body(&self, page_id: &str) -> SyncResult<Option<String>> {
        (**self).page_body(page_id)
    }
}

/// Resolve a label name to its id
///
/// Every page is searched: a match may sit on any page of the results.
pub fn find_label_id<A: ConfluenceApi + ?Sized>(api: &A, label: &str) -> SyncResult<Option<String>> {
    let mut cursor: Option<String> = None;
    let mut pages_seen = 0usize;

    loop {
        let page = api.search_labels(cursor.as_deref())?;
        pages_seen += 1;
        debug!(label, page = pages_seen, results = page.labels.len(), "Searched labels");

        if let Some(found) = page.labels.iter().find(|l| l.name == label) {
            return Ok(Some(found.id.clone()));
        }

        match page.next_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            _ => {
                debug!(label, pages = pages_seen, "Label not found");
                return Ok(None);
            }
        }
    }
}

/// All pages under a label, with bodies fetched individually when missing
pub fn fetch_label_pages<A: ConfluenceApi + ?Sized>(
    api: &A,
    label_id: &str,
) -> SyncResult<Vec<FetchedPage>> {
    let mut fetched = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let batch = api.label_pages(label_id, cursor.as_deref())?;

        for page in batch.pages {
            let body = match page.inline_body() {
                Some(body) => Some(body.to_string()),
                None => api.page_body(&page.id)?,
            };
            fetched.push(FetchedPage {
                id: page.id,
                title: page.title,
                body,
            });
        }

        match batch.next_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            _ => break,
        }
    }

    Ok(fetched)
}

/// Discover a label by name and fetch its pages; `None` when no such label exists
pub fn fetch_by_label<A: ConfluenceApi + ?Sized>(
    api: &A,
    label: &str,
) -> SyncResult<Option<Vec<FetchedPage>>> {
    let Some(label_id) = find_label_id(api, label)? else {
        return Ok(None);
    };
    let pages = fetch_label_pages(api, &label_id)?;
    info!(label, label_id = %label_id, pages = pages.len(), "Fetched label pages");
    Ok(Some(pages))
}

/// Validated wiki credentials
#[derive(Debug, Clone)]
struct Credentials {
    site: Url,
    username: String,
    api_token: String,
}

impl Credentials {
    fn from_config(config: &ConfluenceConfig) -> SyncResult<Self> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let base_url = present(&config.base_url);
        let username = present(&config.username);
        let api_token = present(&config.api_token);

        let mut missing = Vec::new();
        if base_url.is_none() {
            missing.push(format!(
                "Confluence base URL is not set (confluence.base_url or {})",
                ENV_BASE_URL
            ));
        }
        if username.is_none() {
            missing.push(format!(
                "Confluence username is not set (confluence.username or {})",
                ENV_USERNAME
            ));
        }
        if api_token.is_none() {
            missing.push(format!(
                "Confluence API token is not set (confluence.api_token or {})",
                ENV_API_TOKEN
            ));
        }

        match (base_url, username, api_token) {
            (Some(base_url), Some(username), Some(api_token)) => {
                let site = site_url(&base_url)?;
                Ok(Self {
                    site,
                    username,
                    api_token,
                })
            }
            _ => Err(SyncError::Configuration(missing.join("; "))),
        }
    }
}

/// Normalize the configured base URL to the site root, dropping a trailing `/wiki`
fn site_url(base_url: &str) -> SyncResult<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/wiki").unwrap_or(trimmed);
    let url = Url::parse(&format!("{}/", trimmed)).map_err(|e| {
        SyncError::Configuration(format!("invalid Confluence base URL '{}': {}", base_url, e))
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(SyncError::Configuration(format!(
            "invalid Confluence base URL '{}': missing host",
            base_url
        )));
    }
    Ok(url)
}

fn endpoint(site: &Url, path: &str, query: &[(&str, &str)]) -> SyncResult<Url> {
    let mut url = site.join(path).map_err(|e| {
        SyncError::Configuration(format!("invalid endpoint path '{}': {}", path, e))
    })?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn labels_url(site: &Url, cursor: Option<&str>) -> SyncResult<Url> {
    let limit = LABEL_PAGE_SIZE.to_string();
    let mut query = vec![("limit", limit.as_str()), ("prefix", LABEL_PREFIX)];
    if let Some(cursor) = cursor {
        query.push(("cursor", cursor));
    }
    endpoint(site, "wiki/api/v2/labels", &query)
}

fn label_pages_url(site: &Url, label_id: &str, cursor: Option<&str>) -> SyncResult<Url> {
    let limit = PAGE_LIST_SIZE.to_string();
    let mut query = vec![("body-format", "storage"), ("limit", limit.as_str())];
    if let Some(cursor) = cursor {
        query.push(("cursor", cursor));
    }
    endpoint(site, &format!("wiki/api/v2/labels/{}/pages", label_id), &query)
}

fn content_url(site: &Url, page_id: &str) -> SyncResult<Url> {
    endpoint(
        site,
        &format!("wiki/rest/api/content/{}", page_id),
        &[("expand", "body.storage")],
    )
}

/// Blocking HTTP client for the wiki REST API
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    client: Client,
    config: ConfluenceConfig,
}

impl ConfluenceClient {
    /// Create a client; credentials are checked on every request, not here
    pub fn new(config: &ConfluenceConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::remote("create HTTP client", e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn authorized(&self, credentials: &Credentials, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&credentials.username, Some(&credentials.api_token))
            .header("Accept", "application/json")
    }

    /// Send a GET and decode JSON, mapping failures to `SyncError::Remote`
    fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        build: impl FnOnce(&Url) -> SyncResult<Url>,
    ) -> SyncResult<T> {
        let credentials = Credentials::from_config(&self.config)?;
        let url = build(&credentials.site)?;
        debug!(operation, url = %url, "Wiki request");

        let response = self
            .authorized(&credentials, url)
            .send()
            .map_err(|e| SyncError::remote(operation, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SyncError::remote(
                operation,
                format!("HTTP {}: {}", status.as_u16(), error_message(&body, status)),
            ));
        }

        response
            .json()
            .map_err(|e| SyncError::remote(operation, format!("invalid response: {}", e)))
    }
}

/// Best human-readable message from an error response body
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|v| {
        v.get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| {
                v.pointer("/errors/0/title")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
    });

    from_json
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
}

impl ConfluenceApi for ConfluenceClient {
    fn search_labels(&self, cursor: Option<&str>) -> SyncResult<LabelPage> {
        let response: LabelListResponse =
            self.get_json("search labels", |site| labels_url(site, cursor))?;
        Ok(response.into())
    }

    fn label_pages(&self, label_id: &str, cursor: Option<&str>) -> SyncResult<PageBatch> {
        let operation = format!("list pages for label {}", label_id);
        let response: PageListResponse =
            self.get_json(&operation, |site| label_pages_url(site, label_id, cursor))?;
        Ok(PageBatch {
            next_cursor: response.links.next_cursor(),
            pages: response.results,
        })
    }

    fn page_body(&self, page_id: &str) -> SyncResult<Option<String>> {
        let operation = format!("fetch content {}", page_id);
        let response: ContentResponse =
            self.get_json(&operation, |site| content_url(site, page_id))?;
        Ok(response
            .body
            .as_ref()
            .and_then(|b| b.storage_value())
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::types::{Label, PageBody, StorageBody};
    use std::cell::{Cell, RefCell};

    /// In-memory wiki with call counters
    #[derive(Default)]
    struct FakeWiki {
        label_pages_of_results: Vec<Vec<Label>>,
        pages: Vec<Vec<RemotePage>>,
        bodies: Vec<(String, String)>,
        label_calls: Cell<usize>,
        body_calls: RefCell<Vec<String>>,
    }

    fn label(id: &str, name: &str) -> Label {
        Label {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn remote_page(id: &str, title: &str, body: Option<&str>) -> RemotePage {
        RemotePage {
            id: id.to_string(),
            title: title.to_string(),
            body: body.map(|b| PageBody {
                storage: Some(StorageBody {
                    value: Some(b.to_string()),
                }),
            }),
        }
    }

    fn cursor_index(cursor: Option<&str>) -> usize {
        cursor.and_then(|c| c.parse().ok()).unwrap_or(0)
    }

    impl ConfluenceApi for FakeWiki {
        fn search_labels(&self, cursor: Option<&str>) -> SyncResult<LabelPage> {
            self.label_calls.set(self.label_calls.get() + 1);
            let index = cursor_index(cursor);
            let next = index + 1;
            Ok(LabelPage {
                labels: self.label_pages_of_results[index].clone(),
                next_cursor: (next < self.label_pages_of_results.len()).then(|| next.to_string()),
            })
        }

        fn label_pages(&self, _label_id: &str, cursor: Option<&str>) -> SyncResult<PageBatch> {
            let index = cursor_index(cursor);
            let next = index + 1;
            Ok(PageBatch {
                pages: self.pages[index].clone(),
                next_cursor: (next < self.pages.len()).then(|| next.to_string()),
            })
        }

        fn page_body(&self, page_id: &str) -> SyncResult<Option<String>> {
            self.body_calls.borrow_mut().push(page_id.to_string());
            Ok(self
                .bodies
                .iter()
                .find(|(id, _)| id == page_id)
                .map(|(_, b)| b.clone()))
        }
    }

    #[test]
    fn test_label_found_on_last_page() -> SyncResult<()> {
        let wiki = FakeWiki {
            label_pages_of_results: vec![
                vec![label("1", "alpha"), label("2", "beta")],
                vec![label("3", "gamma")],
                vec![label("4", "infra-old"), label("5", "infra")],
            ],
            ..Default::default()
        };

        assert_eq!(find_label_id(&wiki, "infra")?.as_deref(), Some("5"));
        assert_eq!(wiki.label_calls.get(), 3);
        Ok(())
    }

    #[test]
    fn test_label_not_found_exhausts_pages() -> SyncResult<()> {
        let wiki = FakeWiki {
            label_pages_of_results: vec![vec![label("1", "a")], vec![], vec![label("3", "c")]],
            ..Default::default()
        };

        assert_eq!(find_label_id(&wiki, "infra")?, None);
        assert_eq!(wiki.label_calls.get(), 3);
        Ok(())
    }

    #[test]
    fn test_label_match_is_exact() -> SyncResult<()> {
        let wiki = FakeWiki {
            label_pages_of_results: vec![vec![label("1", "infra-team"), label("2", "Infra")]],
            ..Default::default()
        };

        assert_eq!(find_label_id(&wiki, "infra")?, None);
        Ok(())
    }

    #[test]
    fn test_missing_inline_body_fetched_individually() -> SyncResult<()> {
        let wiki = FakeWiki {
            pages: vec![
                vec![remote_page("10", "Inline", Some("<p>inline</p>"))],
                vec![remote_page("11", "Separate", None)],
            ],
            bodies: vec![("11".to_string(), "<p>separate</p>".to_string())],
            ..Default::default()
        };

        let pages = fetch_label_pages(&wiki, "99")?;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].body.as_deref(), Some("<p>inline</p>"));
        assert_eq!(pages[1].body.as_deref(), Some("<p>separate</p>"));
        assert_eq!(*wiki.body_calls.borrow(), vec!["11".to_string()]);
        Ok(())
    }

    #[test]
    fn test_fetch_by_unknown_label() -> SyncResult<()> {
        let wiki = FakeWiki {
            label_pages_of_results: vec![vec![]],
            ..Default::default()
        };
        assert!(fetch_by_label(&wiki, "nothing")?.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_credentials_rejected_before_request() -> SyncResult<()> {
        let client = ConfluenceClient::new(&ConfluenceConfig {
            base_url: Some("https://acme.atlassian.net".to_string()),
            username: None,
            api_token: Some(" ".to_string()),
            timeout_secs: 1,
        })?;

        match client.search_labels(None) {
            Err(SyncError::Configuration(message)) => {
                assert!(message.contains("username"));
                assert!(message.contains("API token"));
                assert!(!message.contains("base URL"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_endpoint_urls() -> SyncResult<()> {
        let site = site_url("https://acme.atlassian.net/wiki/")?;
        assert_eq!(
            labels_url(&site, Some("c1"))?.as_str(),
            "https://acme.atlassian.net/wiki/api/v2/labels?limit=250&prefix=global&cursor=c1"
        );
        assert_eq!(
            label_pages_url(&site, "77", None)?.as_str(),
            "https://acme.atlassian.net/wiki/api/v2/labels/77/pages?body-format=storage&limit=100"
        );
        assert_eq!(
            content_url(&site, "12")?.as_str(),
            "https://acme.atlassian.net/wiki/rest/api/content/12?expand=body.storage"
        );
        Ok(())
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(site_url("not a url"), Err(SyncError::Configuration(_))));
    }

    #[test]
    fn test_error_message_prefers_json() {
        let status = reqwest::StatusCode::NOT_FOUND;
        assert_eq!(error_message(r#"{"message": "No label"}"#, status), "No label");
        assert_eq!(error_message("", status), "Not Found");
        assert_eq!(error_message("gateway down", status), "gateway down");
    }
}
