//! Summary cache - checksum-gated summarization
//!
//! An unchanged page costs one hash and zero summarizer calls: when the
//! stored checksum matches the fresh one, the stored summary is reused.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::checksum::checksum;
use super::summarizer::{truncate_chars, Summarizer};

/// Content sent to the summarizer is capped at this many characters
pub const SUMMARY_INPUT_CHARS: usize = 10_000;

/// Fallback summaries use this many leading characters of content
pub const FALLBACK_PREFIX_CHARS: usize = 80;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Result of summarizing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    pub summary: String,
    pub checksum: Option<String>,
    /// Summary was carried over from the previous entry
    pub reused: bool,
    /// Summarizer was invoked (successfully or not)
    pub generated: bool,
}

/// Summarization gated on content checksums
pub struct SummaryCache<S> {
    summarizer: S,
}

impl<S: Summarizer> SummaryCache<S> {
    pub fn new(summarizer: S) -> Self {
        Self { summarizer }
    }

    pub fn summarizer(&self) -> &S {
        &self.summarizer
    }

    /// Summarize `content`, reusing `previous` when its checksum still matches
    ///
    /// `previous` is the stored `(checksum, summary)` for the same remote id.
    pub fn summarize(
        &self,
        content: &str,
        title: Option<&str>,
        previous: Option<(Option<&str>, &str)>,
    ) -> SummaryOutcome {
        let checksum = checksum(Some(content));

        if let (Some(fresh), Some((Some(stored), summary))) = (checksum.as_deref(), previous) {
            if fresh == stored {
                debug!(checksum = fresh, "Summary cache hit");
                return SummaryOutcome {
                    summary: summary.to_string(),
                    checksum,
                    reused: true,
                    generated: false,
                };
            }
        }

        if checksum.is_none() {
            return SummaryOutcome {
                summary: fallback_summary(content, title),
                checksum,
                reused: false,
                generated: false,
            };
        }

        debug!("Summary cache miss");
        let summary = match self.summarizer.summarize(&summary_prompt(content)) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback_summary(content, title),
            Err(e) => {
                debug!(error = %e, "Summarizer failed, using fallback summary");
                fallback_summary(content, title)
            }
        };

        SummaryOutcome {
            summary,
            checksum,
            reused: false,
            generated: true,
        }
    }
}

fn summary_prompt(content: &str) -> String {
    format!(
        "Summarize the following documentation in 8-12 words, listing the main topics it covers. \
         Respond with the summary only, no preamble.\n\n{}",
        truncate_chars(content, SUMMARY_INPUT_CHARS)
    )
}

/// Deterministic summary used whenever the summarizer is unavailable
pub fn fallback_summary(content: &str, title: Option<&str>) -> String {
    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let collapsed = WHITESPACE.replace_all(content.trim(), " ");
    format!("{}...", truncate_chars(&collapsed, FALLBACK_PREFIX_CHARS))
}
