mod config;
mod email;
mod errors;
mod jobs;
mod llm_client;
mod pipeline;
mod portfolio;
mod render;
mod routes;
mod scrape;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::email::LlmEmailWriter;
use crate::jobs::LlmJobExtractor;
use crate::llm_client::LlmClient;
use crate::pipeline::Pipeline;
use crate::portfolio::CsvPortfolio;
use crate::routes::build_router;
use crate::scrape::fetcher::HttpPageFetcher;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first; a missing API key stops startup here
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MailSculpt v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.anthropic_api_key.clone())?
        .with_base_url(&config.anthropic_base_url);
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        llm_client::MODEL,
        config.anthropic_base_url
    );

    let fetcher = HttpPageFetcher::new(config.fetch_timeout_secs, config.max_page_chars)?;
    let portfolio = CsvPortfolio::new(config.portfolio_path.clone(), config.links_per_skill);
    info!("Portfolio source: {}", config.portfolio_path.display());

    let pipeline = Pipeline::new(
        Arc::new(fetcher),
        Arc::new(LlmJobExtractor::new(llm.clone())),
        Arc::new(portfolio),
        Arc::new(LlmEmailWriter::new(llm, config.sender.clone())),
    );

    let state = AppState {
        pipeline,
        page: config.page.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("127.0.0.1:{}", config.port).parse()?;
    info!("Open http://{addr} in a browser");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
