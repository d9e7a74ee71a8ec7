//! HTML shell: the form page and its submission handler.

use axum::{extract::State, response::Html, Form};
use serde::Deserialize;

use crate::render::render_page;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub job_url: String,
}

/// GET /
pub async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.page, "", None))
}

/// POST /generate
///
/// Runs the pipeline for the submitted URL and renders the form again with
/// the generated emails below it. Failures are shown inline, never as an
/// error status, so the form stays usable for another attempt.
pub async fn handle_generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Html<String> {
    let outcome = state.pipeline.run(&form.job_url).await;
    Html(render_page(&state.page, form.job_url.trim(), Some(&outcome)))
}
