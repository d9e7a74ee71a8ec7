use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::scrape::fetcher::FetchError;

/// Application-level error type.
/// Each variant maps to its own user-facing message and HTTP status, so the
/// HTML shell and the JSON API report the same failure the same way.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Portfolio error: {0}")]
    Portfolio(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Fetch(_) | AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Portfolio(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Fetch(_) => "FETCH_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Portfolio(_) => "PORTFOLIO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The message shown to the person who submitted the URL.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(_) => {
                "Please enter a valid URL (starting with http or https).".to_string()
            }
            AppError::Fetch(e) => format!("Could not fetch the job posting: {e}"),
            AppError::Llm(msg) => {
                format!("The language model could not process the posting: {msg}")
            }
            AppError::Portfolio(msg) => format!("Portfolio lookup failed: {msg}"),
            AppError::Internal(e) => format!("An unexpected error occurred: {e}"),
        }
    }

    /// Logs server-side failures. Validation errors are the caller's problem and stay quiet.
    pub fn log(&self) {
        match self {
            AppError::Validation(msg) => tracing::debug!("Rejected input: {msg}"),
            AppError::Fetch(e) => tracing::warn!("Fetch error: {e}"),
            AppError::Llm(msg) => tracing::error!("LLM error: {msg}"),
            AppError::Portfolio(msg) => tracing::error!("Portfolio error: {msg}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "code": self.code(),
            "message": self.user_message()
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(json!({ "error": self.to_json() }));
        (self.status(), body).into_response()
    }
}
