//! Page fetcher: downloads a job posting and extracts its readable text.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Node, Selector};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_REDIRECTS: usize = 5;

/// Elements whose text never belongs to the posting.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// A fetched job posting page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {0} for {1}")]
    HttpStatus(u16, String),

    #[error("no readable text found at {0}")]
    NoContent(String),

    #[error("refusing to fetch {0}")]
    UnsafeUrl(String),
}

/// Retrieves the text content of a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}

/// reqwest + scraper backed fetcher.
pub struct HttpPageFetcher {
    client: Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(timeout_secs: u64, max_chars: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::custom(check_redirect))
            .build()?;

        Ok(Self { client, max_chars })
    }

    /// Only public http(s) hosts may be fetched; the URL comes straight from a form field.
    pub fn is_safe_url(url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }

        match parsed.host() {
            Some(url::Host::Domain(domain)) => {
                let domain = domain.to_ascii_lowercase();
                domain != "localhost" && !domain.ends_with(".localhost")
            }
            Some(url::Host::Ipv4(ip)) => is_public_ipv4(ip),
            Some(url::Host::Ipv6(ip)) => match ip.to_ipv4_mapped() {
                Some(mapped) => is_public_ipv4(mapped),
                None => is_public_ipv6(ip),
            },
            None => false,
        }
    }
}

fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast())
}

fn is_public_ipv6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = first & 0xfe00 == 0xfc00;
    let link_local = first & 0xffc0 == 0xfe80;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}

/// Every redirect hop goes through the same host check as the submitted URL.
fn check_redirect(attempt: reqwest::redirect::Attempt) -> reqwest::redirect::Action {
    if attempt.previous().len() > MAX_REDIRECTS {
        return attempt.error(format!("more than {MAX_REDIRECTS} redirects"));
    }
    if !HttpPageFetcher::is_safe_url(attempt.url().as_str()) {
        let target = attempt.url().to_string();
        return attempt.error(format!("redirect to unsafe URL {target}"));
    }
    attempt.follow()
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        if !Self::is_safe_url(url) {
            return Err(FetchError::UnsafeUrl(url.to_string()));
        }

        debug!("Fetching job posting from {url}");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16(), url.to_string()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let page = parse_page(url, &html, self.max_chars);
        info!("Fetched {} chars from {url}", page.text.len());
        Ok(page)
    }
}

/// Turns an HTML document into a `PageContent`.
pub fn parse_page(url: &str, html: &str, max_chars: usize) -> PageContent {
    let document = Html::parse_document(html);
    let title = extract_title(&document).unwrap_or_else(|| url.to_string());
    let text = truncate_chars(&extract_body_text(&document), max_chars);

    PageContent {
        url: url.to_string(),
        title,
        text,
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    (!title.is_empty()).then_some(title)
}

/// Collects the body's text nodes, one per line, skipping scripts and styles.
fn extract_body_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut lines = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let inside_skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if inside_skipped {
            continue;
        }
        let line = text.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
