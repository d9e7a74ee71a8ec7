//! Text normalizer: strips markup leftovers, URLs and stray symbols from scraped text.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z!][^<>]*>").expect("tag pattern is valid"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S*").expect("url pattern is valid"));

/// Punctuation that carries meaning in job text ("C++", "C#", "Node.js", "5+ years").
const KEPT_PUNCTUATION: &[char] = &[
    '.', ',', ':', ';', '!', '?', '\'', '"', '-', '+', '#', '/', '&', '%', '(', ')', '@', '_',
];

/// Cleans raw page text for the language model.
///
/// Order matters: symbols are dropped before URLs are removed so that a
/// symbol sitting inside a URL cannot leave a fresh URL behind, which keeps
/// the function idempotent.
pub fn clean_text(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");

    let filtered: String = without_tags
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(c))
        .collect();

    let without_urls = URL_RE.replace_all(&filtered, "");

    without_urls.split_whitespace().collect::<Vec<_>>().join(" ")
}
