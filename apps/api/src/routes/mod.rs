pub mod emails;
pub mod health;
pub mod ui;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::handle_index))
        .route("/generate", post(ui::handle_generate))
        .route("/health", get(health::health_handler))
        .route("/api/v1/emails", post(emails::handle_generate_emails))
        .with_state(state)
}
