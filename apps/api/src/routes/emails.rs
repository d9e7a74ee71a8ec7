//! JSON API for the email pipeline.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::GeneratedEmail;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateEmailsRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateEmailsResponse {
    pub emails: Vec<GeneratedEmail>,
    pub error: Option<Value>,
}

/// POST /api/v1/emails
///
/// Same pipeline as the form. Emails written before a failure are still
/// returned with status 200; a failure before the first email uses the
/// error's own status.
pub async fn handle_generate_emails(
    State(state): State<AppState>,
    Json(request): Json<GenerateEmailsRequest>,
) -> Response {
    let outcome = state.pipeline.run(&request.url).await;

    let status = match &outcome.error {
        Some(e) if outcome.emails.is_empty() => e.status(),
        _ => StatusCode::OK,
    };

    let body = GenerateEmailsResponse {
        error: outcome.error.as_ref().map(|e| e.to_json()),
        emails: outcome.emails,
    };

    (status, Json(body)).into_response()
}
