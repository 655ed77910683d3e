//! Title inference for web pages
//!
//! 1. A descriptive `<title>` tag wins.
//! 2. Thin pages (under 50 characters of content) use the fallback title:
//!    the `<title>` if it is not generic, else one derived from the URL.
//! 3. Otherwise the summarizer proposes a 3-8 word title, falling back
//!    as in step 2 when it fails.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use super::summarizer::{truncate_chars, Summarizer};
use super::transform::decode_entities;

/// `<title>` tags must be longer than this to be used directly
pub const MIN_HTML_TITLE_CHARS: usize = 10;

/// Pages with less extracted content than this skip the summarizer
pub const MIN_CONTENT_FOR_SUMMARY: usize = 50;

/// Content sent to the summarizer for titling is capped at this many characters
pub const TITLE_INPUT_CHARS: usize = 1000;

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static GENERIC_TITLES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(home|index|welcome|untitled|page|default)(\s*[|:\-–]\s*.*)?$",
        r"(\.\.\.|…)\s*$",
        r"\s-\s.+\s-\s\d+\s*$",
        r"(?i)^(how do i|what is)\b.*\b(a|an|the|to|for|of|in|on|with|and|or|from|by|my|your)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Text of the `<title>` tag, entity-decoded and whitespace-collapsed
pub fn html_title(html: &str) -> Option<String> {
    let raw = TITLE_TAG.captures(html)?.get(1)?.as_str();
    let decoded = decode_entities(raw);
    let title = WHITESPACE.replace_all(decoded.trim(), " ").into_owned();
    (!title.is_empty()).then_some(title)
}

/// Whether a title says nothing about the page (site boilerplate, truncation)
pub fn is_generic_title(title: &str) -> bool {
    GENERIC_TITLES.iter().any(|re| re.is_match(title.trim()))
}

/// Title derived from the last path segment, else the host
pub fn url_title(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| {
            s.trim_end_matches(".html")
                .trim_end_matches(".htm")
                .to_string()
        })
        .filter(|s| !s.is_empty());

    match segment {
        Some(segment) => segment
            .split(|c| c == '-' || c == '_')
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
        None => parsed.host_str().unwrap_or(url).to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title used when neither the `<title>` tag nor the summarizer can be used
pub fn fallback_title(html_title: Option<&str>, url: &str) -> String {
    html_title
        .filter(|t| !is_generic_title(t))
        .map(str::to_string)
        .unwrap_or_else(|| url_title(url))
}

/// Infer a title for a fetched web page
pub fn infer_title<S: Summarizer + ?Sized>(
    html: &str,
    markdown: &str,
    url: &str,
    summarizer: &S,
) -> String {
    let tag = html_title(html);
    if let Some(title) = tag.as_deref() {
        if title.chars().count() > MIN_HTML_TITLE_CHARS && !is_generic_title(title) {
            return title.to_string();
        }
    }

    let fallback = fallback_title(tag.as_deref(), url);
    if markdown.trim().chars().count() < MIN_CONTENT_FOR_SUMMARY {
        return fallback;
    }

    let prompt = format!(
        "Write a descriptive 3-8 word title for the following documentation. \
         Respond with the title only, no quotes.\n\n{}",
        truncate_chars(markdown, TITLE_INPUT_CHARS)
    );
    match summarizer.summarize(&prompt) {
        Ok(text) => {
            let title = text.trim().trim_matches(|c| c == '"' || c == '\'').trim();
            if title.is_empty() {
                fallback
            } else {
                title.to_string()
            }
        }
        Err(e) => {
            debug!(error = %e, url, "Title generation failed, using fallback");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::summarizer::SummarizerError;
    use std::cell::Cell;

    struct FixedSummarizer {
        calls: Cell<usize>,
        reply: Option<&'static str>,
    }

    impl FixedSummarizer {
        fn new(reply: Option<&'static str>) -> Self {
            Self {
                calls: Cell::new(0),
                reply,
            }
        }
    }

    impl Summarizer for FixedSummarizer {
        fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
            self.calls.set(self.calls.get() + 1);
            assert!(prompt.contains("3-8 word title"));
            self.reply
                .map(str::to_string)
                .ok_or_else(|| SummarizerError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_descriptive_html_title_wins() {
        let summarizer = FixedSummarizer::new(Some("unused"));
        let html = "<title>Kubernetes Ingress &amp; TLS Setup</title>";
        let title = infer_title(html, &"x".repeat(500), "https://a.dev/x", &summarizer);
        assert_eq!(title, "Kubernetes Ingress & TLS Setup");
        assert_eq!(summarizer.calls.get(), 0);
    }

    #[test]
    fn test_generic_title_thin_page_uses_url() {
        let summarizer = FixedSummarizer::new(Some("unused"));
        let html = "<html><title>Home</title><body>0123456789</body></html>";
        let title = infer_title(html, "0123456789", "https://docs.example.com/getting-started", &summarizer);
        assert_eq!(title, "Getting Started");
        assert_eq!(summarizer.calls.get(), 0);
    }

    #[test]
    fn test_short_specific_title_kept_for_thin_page() {
        let summarizer = FixedSummarizer::new(None);
        let title = infer_title("<title>Rust FAQ</title>", "short", "https://a.dev/faq", &summarizer);
        assert_eq!(title, "Rust FAQ");
    }

    #[test]
    fn test_summarizer_title_for_rich_page() {
        let summarizer = FixedSummarizer::new(Some("  \"Configuring Ingress Controllers\"  "));
        let title = infer_title("<title>Home</title>", &"content ".repeat(20), "https://a.dev/", &summarizer);
        assert_eq!(title, "Configuring Ingress Controllers");
        assert_eq!(summarizer.calls.get(), 1);
    }

    #[test]
    fn test_summarizer_failure_falls_back() {
        let summarizer = FixedSummarizer::new(None);
        let title = infer_title("", &"content ".repeat(20), "https://a.dev/", &summarizer);
        assert_eq!(title, "a.dev");
        assert_eq!(summarizer.calls.get(), 1);
    }

    #[test]
    fn test_generic_patterns() {
        assert!(is_generic_title("Home"));
        assert!(is_generic_title("  untitled "));
        assert!(is_generic_title("Welcome | Acme Docs"));
        assert!(is_generic_title("Everything you need to know about..."));
        assert!(is_generic_title("Question title - Stack Site - 12345"));
        assert!(is_generic_title("How do I configure the proxy for"));
        assert!(is_generic_title("What is the difference between a"));
    }

    #[test]
    fn test_descriptive_titles_are_not_generic() {
        for title in [
            "Default Arguments in Python Functions",
            "Page Object Model Patterns",
            "Index Types in PostgreSQL",
            "Welcome Emails with Postmark",
            "What is Kubernetes",
            "How do I configure the proxy?",
            "Homebrew Formula Cookbook",
            "Deploying Services on Nomad",
        ] {
            assert!(!is_generic_title(title), "{} should not be generic", title);
        }
    }

    #[test]
    fn test_descriptive_title_starting_with_generic_word_wins() {
        let summarizer = FixedSummarizer::new(Some("unused"));
        let title = infer_title(
            "<title>Default Arguments in Python Functions</title>",
            "short",
            "https://a.dev/py/args",
            &summarizer,
        );
        assert_eq!(title, "Default Arguments in Python Functions");
        assert_eq!(summarizer.calls.get(), 0);
    }

    #[test]
    fn test_url_title() {
        assert_eq!(url_title("https://x.io/guides/rate_limit-tuning/"), "Rate Limit Tuning");
        assert_eq!(url_title("https://x.io/docs/setup.html"), "Setup");
        assert_eq!(url_title("https://x.io/"), "x.io");
    }

    #[test]
    fn test_html_title_collapses_whitespace() {
        assert_eq!(
            html_title("<TITLE>\n  Release   Notes &quot;v2&quot;\n</TITLE>").as_deref(),
            Some("Release Notes \"v2\"")
        );
        assert_eq!(html_title("<title>  </title>"), None);
    }
}
