mod config;
mod errors;
mod llm_client;
mod retrieval;
mod review;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::retrieval::search::DuckDuckGoSearch;
use crate::retrieval::ContextRetriever;
use crate::review::pipeline::AgentPipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RAG review API v{}", env!("CARGO_PKG_VERSION"));

    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; review requests will fail with a configuration error");
    }

    // Initialize LLM client
    let llm = LlmClient::new(&config)?;
    info!(
        "LLM client initialized (chat: {}, embeddings: {}, deep research: {} / fallback: {})",
        llm.chat_model(),
        config.embedding_model,
        config.deep_research_model,
        config.fallback_model()
    );

    // Initialize context retriever (owns the process-wide context cache)
    let search = Arc::new(DuckDuckGoSearch::new()?);
    let retriever = ContextRetriever::from_config(&config, Arc::new(llm.clone()), search);
    info!(
        "Context retriever initialized (strategies: {:?}, strict: {}, cache ttl: {}s)",
        retriever.strategy_names(),
        config.strict_deep_research,
        config.cache_ttl.as_secs()
    );

    // Build app state
    let state = AppState {
        retriever: Arc::new(retriever),
        pipeline: Arc::new(AgentPipeline::new(llm)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
