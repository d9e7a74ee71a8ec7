use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

/// The bundled sample portfolio, independent of the working directory.
pub const DEFAULT_PORTFOLIO_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/resource/portfolio.csv");

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub port: u16,
    pub rust_log: String,
    pub portfolio_path: PathBuf,
    pub links_per_skill: usize,
    pub fetch_timeout_secs: u64,
    pub max_page_chars: usize,
    pub sender: SenderProfile,
    pub page: PageConfig,
}

/// Who the generated emails are written on behalf of.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderProfile {
    pub name: String,
    pub role: String,
    pub company: String,
    pub pitch: String,
}

impl Default for SenderProfile {
    fn default() -> Self {
        Self {
            name: "Alex".to_string(),
            role: "Business Development Executive".to_string(),
            company: "Northwind Software".to_string(),
            pitch: "an AI and software consulting company that helps businesses automate \
                    their processes and scale with tailored engineering teams"
                .to_string(),
        }
    }
}

/// Presentation settings for the single-page UI, handed to the shell at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub title: String,
    pub heading: String,
    pub tagline: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Cold Email Generator".to_string(),
            heading: "MailSculpt : Cold Mail Generator".to_string(),
            tagline: "Personalized job emails made easy and effective.".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let sender_defaults = SenderProfile::default();
        let page_defaults = PageConfig::default();

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_base_url: env_or("ANTHROPIC_BASE_URL", DEFAULT_BASE_URL.to_string()),
            port: parse_env("PORT", 8501)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            portfolio_path: std::env::var("PORTFOLIO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_PORTFOLIO_PATH)),
            links_per_skill: parse_env("PORTFOLIO_LINKS_PER_SKILL", 2)?,
            fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECS", 30)?,
            max_page_chars: parse_env("FETCH_MAX_PAGE_CHARS", 20_000)?,
            sender: SenderProfile {
                name: env_or("SENDER_NAME", sender_defaults.name),
                role: env_or("SENDER_ROLE", sender_defaults.role),
                company: env_or("SENDER_COMPANY", sender_defaults.company),
                pitch: env_or("SENDER_PITCH", sender_defaults.pitch),
            },
            page: PageConfig {
                title: env_or("PAGE_TITLE", page_defaults.title),
                heading: env_or("PAGE_HEADING", page_defaults.heading),
                tagline: env_or("PAGE_TAGLINE", page_defaults.tagline),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}
