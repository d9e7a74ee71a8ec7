//! Email pipeline: one submission, start to finish.
//!
//! Flow: validate_url → fetch → clean_text → portfolio.load → extract_jobs →
//!       per job: query_links → write_mail.
//!
//! Strictly sequential. The first failure ends the run; emails written
//! before it are kept so the caller can still show them.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use url::Url;

use crate::email::EmailWriter;
use crate::errors::AppError;
use crate::jobs::JobExtractor;
use crate::portfolio::{PortfolioIndex, PortfolioLink};
use crate::scrape::fetcher::{FetchError, PageFetcher};
use crate::scrape::normalizer::clean_text;

/// One generated email, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedEmail {
    pub role: Option<String>,
    pub links: Vec<PortfolioLink>,
    pub body: String,
}

/// Result of one submission.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub emails: Vec<GeneratedEmail>,
    pub error: Option<AppError>,
}

/// Holds the collaborators the shell sequences on each submission.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn JobExtractor>,
    portfolio: Arc<dyn PortfolioIndex>,
    writer: Arc<dyn EmailWriter>,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn JobExtractor>,
        portfolio: Arc<dyn PortfolioIndex>,
        writer: Arc<dyn EmailWriter>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            portfolio,
            writer,
        }
    }

    pub async fn run(&self, raw_url: &str) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::default();
        if let Err(e) = self.generate_into(raw_url, &mut outcome.emails).await {
            e.log();
            outcome.error = Some(e);
        }
        outcome
    }

    async fn generate_into(
        &self,
        raw_url: &str,
        emails: &mut Vec<GeneratedEmail>,
    ) -> Result<(), AppError> {
        let url = validate_url(raw_url)?;

        info!("Fetching job posting {url}");
        let page = self.fetcher.fetch(url.as_str()).await?;

        let text = clean_text(&page.text);
        if text.is_empty() {
            return Err(AppError::Fetch(FetchError::NoContent(page.url)));
        }

        self.portfolio.load().await?;

        let jobs = self.extractor.extract_jobs(&text).await?;
        info!("Writing emails for {} job(s) from {}", jobs.len(), page.title);

        for job in &jobs {
            let links = self.portfolio.query_links(&job.skills).await?;
            let body = self.writer.write_mail(job, &links).await?;
            emails.push(GeneratedEmail {
                role: job.role.clone(),
                links,
                body,
            });
        }

        Ok(())
    }
}

/// Accepts http(s) URLs with a host; anything else is a validation error.
pub fn validate_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("http") {
        return Err(AppError::Validation(format!(
            "'{trimmed}' does not start with http or https"
        )));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| AppError::Validation(format!("'{trimmed}' is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::Validation(format!(
            "'{trimmed}' is not an http(s) URL"
        )));
    }

    Ok(url)
}
