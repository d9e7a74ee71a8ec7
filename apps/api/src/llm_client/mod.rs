//! LLM Client: every language-model call in MailSculpt goes through here.
//!
//! Job extraction and email writing both build on `call_text` / `call_json`;
//! neither talks to the Anthropic API on its own.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

/// Default API host; `ANTHROPIC_BASE_URL` may point elsewhere (a proxy, a gateway).
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for extraction and email generation.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;
const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;
const BACKOFF_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates all text blocks of the response.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Thin wrapper over the Anthropic Messages API with retry and JSON helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    backoff_base: Duration,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: format!("{DEFAULT_BASE_URL}{MESSAGES_PATH}"),
            backoff_base: BACKOFF_BASE,
        })
    }

    /// Sends requests to `base_url` instead of the public API host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = format!("{}{MESSAGES_PATH}", base_url.trim_end_matches('/'));
        self
    }

    #[cfg(test)]
    pub(crate) fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Makes a raw call, returning the full response object.
    /// Retries transport errors, 429 and 5xx with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = backoff_delay(self.backoff_base, attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 {
                warn!("LLM API rate limited the request");
                last_error = Some(LlmError::RateLimited {
                    retries: MAX_ATTEMPTS,
                });
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {status}: {body}");
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_ATTEMPTS,
        }))
    }

    /// Calls the model and returns its text answer, trimmed.
    pub async fn call_text(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(LlmError::EmptyContent)
    }

    /// Calls the model and deserializes its text answer as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.call_text(prompt, system).await?;
        serde_json::from_str(strip_json_fences(&text)).map_err(LlmError::Parse)
    }
}

/// base, 2 * base, 4 * base, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1 << attempt.saturating_sub(1))
}

fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_support::{text_reply, StubApi};
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[{\"role\": \"Engineer\"}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"role\": \"Engineer\"}]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"role\": \"Engineer\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"role\": \"Engineer\"}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n{\"role\": \"Engineer\"}";
        assert_eq!(strip_json_fences(input), "{\"role\": \"Engineer\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"role\": \"Engineer\"}  ";
        assert_eq!(strip_json_fences(input), "{\"role\": \"Engineer\"}");
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let response: LlmResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "Dear hiring manager,"},
                {"type": "tool_use"},
                {"type": "text", "text": " hello."}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Dear hiring manager, hello."));
    }

    #[test]
    fn test_response_text_empty_is_none() {
        let response: LlmResponse = serde_json::from_value(serde_json::json!({
            "content": [{"type": "text", "text": "   "}],
            "usage": {"input_tokens": 1, "output_tokens": 0}
        }))
        .unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_api_error_message_prefers_structured_body() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad key"}}"#;
        assert_eq!(api_error_message(body.to_string()), "bad key");
        assert_eq!(api_error_message("plain".to_string()), "plain");
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(BACKOFF_BASE, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(BACKOFF_BASE, 2), Duration::from_secs(2));
    }

    #[test]
    fn test_with_base_url_targets_messages_path() {
        let client = LlmClient::new("key".to_string())
            .unwrap()
            .with_base_url("http://127.0.0.1:9000/");
        assert_eq!(client.endpoint, "http://127.0.0.1:9000/v1/messages");
    }

    #[tokio::test]
    async fn test_call_returns_first_successful_response() {
        let stub = StubApi::spawn(vec![text_reply("Hello there")]).await;
        let text = stub.client().call_text("prompt", "system").await.unwrap();
        assert_eq!(text, "Hello there");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_call_retries_server_errors_then_succeeds() {
        let stub = StubApi::spawn(vec![
            (500, json!({"error": {"message": "overloaded"}})),
            (503, json!({})),
            text_reply("ok"),
        ])
        .await;
        let text = stub.client().call_text("prompt", "system").await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test]
    async fn test_call_gives_up_after_max_attempts_on_server_error() {
        let stub = StubApi::spawn(vec![(500, json!({"error": {"message": "overloaded"}}))]).await;
        let err = stub.client().call("prompt", "system").await.unwrap_err();
        assert!(
            matches!(err, LlmError::Api { status: 500, ref message } if message == "overloaded"),
            "unexpected error: {err:?}"
        );
        assert_eq!(stub.calls(), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_call_reports_rate_limit_after_max_attempts() {
        let stub = StubApi::spawn(vec![(429, json!({}))]).await;
        let err = stub.client().call("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { retries: MAX_ATTEMPTS }));
        assert_eq!(stub.calls(), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_call_does_not_retry_client_errors() {
        let stub = StubApi::spawn(vec![(
            401,
            json!({"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}),
        )])
        .await;
        let err = stub.client().call("prompt", "system").await.unwrap_err();
        assert!(
            matches!(err, LlmError::Api { status: 401, ref message } if message == "invalid x-api-key")
        );
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_call_retries_transport_errors() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LlmClient::new("key".to_string())
            .unwrap()
            .with_base_url(&format!("http://{addr}"))
            .with_backoff_base(Duration::from_millis(1));
        let err = client.call("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }

    #[tokio::test]
    async fn test_call_text_rejects_empty_content() {
        let stub = StubApi::spawn(vec![text_reply("  ")]).await;
        let err = stub.client().call_text("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_call_json_decodes_fenced_answer() {
        #[derive(Deserialize)]
        struct Answer {
            role: String,
        }

        let stub = StubApi::spawn(vec![text_reply("```json\n{\"role\": \"SRE\"}\n```")]).await;
        let answer: Answer = stub.client().call_json("prompt", "system").await.unwrap();
        assert_eq!(answer.role, "SRE");
    }

    #[tokio::test]
    async fn test_call_json_reports_prose_as_parse_error() {
        let stub = StubApi::spawn(vec![text_reply("No jobs here.")]).await;
        let err = stub
            .client()
            .call_json::<serde_json::Value>("prompt", "system")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }
}

/// In-process stand-in for the Messages API.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::{LlmClient, MESSAGES_PATH};

    /// A successful Messages API body carrying `text`.
    pub fn text_reply(text: &str) -> (u16, Value) {
        (
            200,
            json!({
                "content": [{"type": "text", "text": text}],
                "usage": {"input_tokens": 12, "output_tokens": 34}
            }),
        )
    }

    #[derive(Clone)]
    struct StubState {
        replies: Arc<Vec<(u16, Value)>>,
        calls: Arc<AtomicUsize>,
    }

    /// Answers the n-th request with the n-th reply; the last reply repeats.
    pub struct StubApi {
        base_url: String,
        calls: Arc<AtomicUsize>,
    }

    impl StubApi {
        pub async fn spawn(replies: Vec<(u16, Value)>) -> Self {
            let calls = Arc::new(AtomicUsize::new(0));
            let state = StubState {
                replies: Arc::new(replies),
                calls: calls.clone(),
            };
            let app = Router::new()
                .route(MESSAGES_PATH, post(reply))
                .with_state(state);

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

            Self {
                base_url: format!("http://{addr}"),
                calls,
            }
        }

        pub fn client(&self) -> LlmClient {
            LlmClient::new("test-key".to_string())
                .unwrap()
                .with_base_url(&self.base_url)
                .with_backoff_base(Duration::from_millis(1))
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    async fn reply(State(state): State<StubState>) -> (StatusCode, Json<Value>) {
        let n = state.calls.fetch_add(1, Ordering::SeqCst);
        let (status, body) = state
            .replies
            .get(n)
            .or(state.replies.last())
            .cloned()
            .unwrap_or((500, Value::Null));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
    }
}
