//! Wiki API types
//!
//! DTOs for the Confluence REST API responses the sync engine reads.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

/// Ids arrive as strings from v2 endpoints and as numbers from some v1 ones
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

// ============== Labels ==============

/// A label from the label search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

/// Pagination links attached to list responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

impl Links {
    /// Cursor token carried in the `next` link, if there is another page
    pub fn next_cursor(&self) -> Option<String> {
        next_cursor(self.next.as_deref()?)
    }
}

/// Response of `GET /labels`
#[derive(Debug, Clone, Deserialize)]
pub struct LabelListResponse {
    #[serde(default)]
    pub results: Vec<Label>,
    #[serde(default, rename = "_links")]
    pub links: Links,
}

/// One page of label search results, as seen by discovery
#[derive(Debug, Clone, Default)]
pub struct LabelPage {
    pub labels: Vec<Label>,
    pub next_cursor: Option<String>,
}

impl From<LabelListResponse> for LabelPage {
    fn from(response: LabelListResponse) -> Self {
        Self {
            next_cursor: response.links.next_cursor(),
            labels: response.results,
        }
    }
}

// ============== Pages ==============

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageBody {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageBody {
    #[serde(default)]
    pub storage: Option<StorageBody>,
}

impl PageBody {
    /// Storage-format XHTML, if the response carried any
    pub fn storage_value(&self) -> Option<&str> {
        self.storage.as_ref()?.value.as_deref()
    }
}

/// A page listed under a label
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePage {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<PageBody>,
}

impl RemotePage {
    pub fn inline_body(&self) -> Option<&str> {
        self.body.as_ref()?.storage_value().filter(|b| !b.is_empty())
    }
}

/// Response of `GET /labels/{id}/pages`
#[derive(Debug, Clone, Deserialize)]
pub struct PageListResponse {
    #[serde(default)]
    pub results: Vec<RemotePage>,
    #[serde(default, rename = "_links")]
    pub links: Links,
}

/// Response of `GET /content/{id}?expand=body.storage`
#[derive(Debug, Clone, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub body: Option<PageBody>,
}

/// Extract the `cursor` query parameter from a (possibly relative) next link
pub fn next_cursor(next: &str) -> Option<String> {
    let base = Url::parse("http://localhost/").ok()?;
    let url = base.join(next).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "cursor")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
