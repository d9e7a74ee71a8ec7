//! Job extractor: asks the LLM for the job postings contained in a page.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::prompts::{EXTRACT_JOBS_PROMPT_TEMPLATE, EXTRACT_JOBS_SYSTEM};
use crate::llm_client::LlmClient;

/// One job posting as returned by the model.
///
/// Only `skills` matters to the pipeline; everything else is passed through
/// to the email writer as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Missing or null skills become an empty list.
    #[serde(default, deserialize_with = "skills_from_value")]
    pub skills: Vec<String>,

    /// Any other field the model returned (e.g. `experience`).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// The model answers with an array, a bare object, or occasionally `{"jobs": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum JobsPayload {
    Many(Vec<ExtractedJob>),
    Wrapped { jobs: Vec<ExtractedJob> },
    One(ExtractedJob),
}

/// Accepts `["a", "b"]`, `"a, b"` or null.
fn skills_from_value<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let skills = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(_) => Vec::new(),
    };

    Ok(skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

impl JobsPayload {
    fn into_jobs(self) -> Vec<ExtractedJob> {
        match self {
            JobsPayload::Many(jobs) | JobsPayload::Wrapped { jobs } => jobs,
            JobsPayload::One(job) => vec![job],
        }
    }
}

pub fn build_extract_prompt(cleaned_text: &str) -> String {
    EXTRACT_JOBS_PROMPT_TEMPLATE.replace("{page_text}", cleaned_text)
}

/// Turns cleaned page text into structured job records.
#[async_trait]
pub trait JobExtractor: Send + Sync {
    async fn extract_jobs(&self, cleaned_text: &str) -> Result<Vec<ExtractedJob>, AppError>;
}

pub struct LlmJobExtractor {
    llm: LlmClient,
}

impl LlmJobExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl JobExtractor for LlmJobExtractor {
    async fn extract_jobs(&self, cleaned_text: &str) -> Result<Vec<ExtractedJob>, AppError> {
        let prompt = build_extract_prompt(cleaned_text);
        let jobs = self
            .llm
            .call_json::<JobsPayload>(&prompt, EXTRACT_JOBS_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Job extraction failed: {e}")))?
            .into_jobs();

        info!("Extracted {} job(s) from posting", jobs.len());
        Ok(jobs)
    }
}
