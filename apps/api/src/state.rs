use crate::config::PageConfig;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    /// Presentation settings for the UI, fixed at startup.
    pub page: PageConfig,
}
