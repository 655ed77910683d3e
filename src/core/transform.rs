//! Transform - HTML to Markdown
//!
//! Web pages go through main-content extraction and noise stripping
//! before conversion. Wiki storage bodies are converted directly.
//!
//! # Extraction order
//! `<main>`, then `<article>`, then a content/post/docs div (or
//! `id="content"`), each accepted only when its body exceeds 100
//! characters. `<body>` is the unconditional fallback.
//!
//! Conversion never fails: if the Markdown converter errors, a plain-text
//! extraction is used instead, and a fixed sentinel if even that is empty.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Candidate bodies must be longer than this to be accepted
pub const MIN_CANDIDATE_CHARS: usize = 100;

/// Plain-text fallbacks shorter than this are replaced by [`EMPTY_CONTENT`]
pub const MIN_PLAIN_TEXT_CHARS: usize = 20;

/// Returned when nothing usable could be extracted
pub const EMPTY_CONTENT: &str = "[Content could not be extracted]";

const NOISE_TAGS: [&str; 4] = ["nav", "header", "footer", "aside"];

const NOISE_NAMES: &str = "nav|header|footer|aside|sidebar|menu|breadcrumb";

const NOISE_DIV_CLASSES: &str = "comment|social|share|ad|advertisement|popup|modal";

/// Tags whose class/id is checked against [`NOISE_NAMES`]
const NOISE_CANDIDATE_TAGS: [&str; 11] = [
    "div", "section", "nav", "header", "footer", "aside", "ul", "ol", "li", "span", "p",
];

static CANDIDATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<main\b[^>]*>(.*?)</main>",
        r"(?is)<article\b[^>]*>(.*?)</article>",
        r#"(?is)<div\b[^>]*(?:class\s*=\s*["'][^"']*\b(?:content|post|docs|documentation)\b[^"']*["']|id\s*=\s*["']content["'])[^>]*>(.*?)</div>"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)</body>").expect("valid regex"));

static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut patterns = vec![
        r"(?is)<script\b[^>]*>.*?</script>".to_string(),
        r"(?is)<style\b[^>]*>.*?</style>".to_string(),
    ];
    for tag in NOISE_TAGS {
        patterns.push(format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}>"));
    }
    for tag in NOISE_CANDIDATE_TAGS {
        patterns.push(format!(
            r#"(?is)<{tag}\b[^>]*\b(?:class|id)\s*=\s*["'][^"']*(?:{NOISE_NAMES})[^"']*["'][^>]*>.*?</{tag}>"#
        ));
    }
    patterns.push(format!(
        r#"(?is)<div\b[^>]*\bclass\s*=\s*["'][^"']*\b(?:{NOISE_DIV_CLASSES})s?\b[^"']*["'][^>]*>.*?</div>"#
    ));
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Pick the main content region of a web page and strip page chrome
pub fn extract_main_content(html: &str) -> String {
    let region = CANDIDATES
        .iter()
        .find_map(|re| {
            re.captures(html)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .filter(|body| body.chars().count() > MIN_CANDIDATE_CHARS)
        })
        .or_else(|| BODY.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str()))
        .unwrap_or(html);

    strip_noise(region)
}

/// Remove scripts, styles, navigation chrome and ad/comment blocks
pub fn strip_noise(html: &str) -> String {
    let mut cleaned = html.to_string();
    for re in NOISE.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    collapse_newlines(&cleaned)
}

/// Web page HTML to Markdown, with content extraction
pub fn web_to_markdown(html: &str) -> String {
    html_to_markdown(&extract_main_content(html))
}

/// Convert hypertext to GitHub-flavored Markdown, degrading to plain text
pub fn html_to_markdown(html: &str) -> String {
    match htmd::convert(html) {
        Ok(markdown) => collapse_newlines(markdown.trim()),
        Err(e) => {
            warn!(error = %e, "Markdown conversion failed, falling back to plain text");
            degrade(html)
        }
    }
}

/// Plain-text rendition used when Markdown conversion fails
fn degrade(html: &str) -> String {
    let text = plain_text(html);
    if text.chars().count() < MIN_PLAIN_TEXT_CHARS {
        EMPTY_CONTENT.to_string()
    } else {
        text
    }
}

/// Strip tags, decode common entities and collapse whitespace
pub fn plain_text(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Decode the small set of entities found in titles and page text
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse_newlines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(words: usize) -> String {
        vec!["documentation"; words].join(" ")
    }

    #[test]
    fn test_prefers_main_over_body() {
        let html = format!(
            "<html><body><div>outside</div><main><p>{}</p></main></body></html>",
            filler(20)
        );
        let region = extract_main_content(&html);
        assert!(region.contains("documentation"));
        assert!(!region.contains("outside"));
    }

    #[test]
    fn test_short_main_falls_through_to_article() {
        let html = format!(
            "<body><main>tiny</main><article><p>{}</p></article></body>",
            filler(20)
        );
        let region = extract_main_content(&html);
        assert!(!region.contains("tiny"));
        assert!(region.contains("documentation"));
    }

    #[test]
    fn test_content_div_candidate() {
        let html = format!(
            "<body><p>chrome</p><div class=\"post-content\"><p>{}</p></div></body>",
            filler(20)
        );
        let region = extract_main_content(&html);
        assert!(!region.contains("chrome"));
    }

    #[test]
    fn test_body_is_unconditional_fallback() {
        let html = "<html><body><p>short</p></body></html>";
        assert_eq!(extract_main_content(html).trim(), "<p>short</p>");
    }

    #[test]
    fn test_strips_noise() {
        let html = r#"<script>var x = 1;</script><style>p {}</style>
<nav><a href="/">Home</a></nav>
<div class="sidebar-left">links</div>
<ul id="main-menu"><li>item</li></ul>
<div class="share-buttons">tweet</div>
<div class="comments">first!</div>
<p>Keep me</p>"#;
        let cleaned = strip_noise(html);
        for gone in ["var x", "p {}", "Home", "links", "item", "tweet", "first!"] {
            assert!(!cleaned.contains(gone), "{} should be stripped", gone);
        }
        assert!(cleaned.contains("Keep me"));
    }

    #[test]
    fn test_ad_class_needs_word_boundary() {
        let html = r#"<div class="loading-indicator">still here</div><div class="ad">buy</div>"#;
        let cleaned = strip_noise(html);
        assert!(cleaned.contains("still here"));
        assert!(!cleaned.contains("buy"));
    }

    #[test]
    fn test_collapses_blank_lines() {
        assert_eq!(strip_noise("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_converts_to_markdown() {
        let markdown = html_to_markdown("<h1>Runbook</h1><p>Restart <strong>api</strong></p>");
        assert!(markdown.contains("Runbook"));
        assert!(markdown.contains("**api**"));
        assert!(!markdown.contains("<p>"));
    }

    #[test]
    fn test_degrade_keeps_long_plain_text() {
        let text = degrade("<div><p>Rotate the signing keys</p> <p>every &lt;90&gt; days.</p></div>");
        assert_eq!(text, "Rotate the signing keys every <90> days.");
    }

    #[test]
    fn test_degrade_short_text_becomes_sentinel() {
        assert_eq!(degrade("<p>tiny</p>"), EMPTY_CONTENT);
        assert_eq!(degrade("<script></script>"), EMPTY_CONTENT);
    }

    #[test]
    fn test_plain_text_extractor() {
        let text = plain_text("<p>Fish &amp; chips</p>\n\n<p>&lt;tasty&gt;</p>");
        assert_eq!(text, "Fish & chips <tasty>");
    }

    #[test]
    fn test_decode_entities_does_not_double_decode() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("it&#39;s &apos;ok&apos;"), "it's 'ok'");
    }
}
