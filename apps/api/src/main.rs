mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::ResumeAnalyzer;
use crate::config::{Config, StorageBackend};
use crate::db::{create_pool, run_migrations};
use crate::llm_client::{CompletionService, LlmClient, RateLimitedClient, RateLimiter};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{AnalysisStore, InMemoryAnalysisStore, PgAnalysisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Resume Review API v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.app_env
    );
    if config.analysis.allow_fallback {
        warn!("Fallback reviews are enabled; failed scoring calls will store placeholder results");
    }

    // Initialize storage
    let store: Arc<dyn AnalysisStore> = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            run_migrations(&pool).await?;
            Arc::new(PgAnalysisStore::new(pool))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; analyses are lost on restart");
            Arc::new(InMemoryAnalysisStore::default())
        }
    };
    info!("Storage backend: {}", store.backend());

    // Initialize LLM client behind the process-wide rate limiter
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_min_interval));
    let client = LlmClient::new(config.anthropic_api_key.clone())?;
    info!(
        "LLM client initialized (model: {}, min interval: {}ms)",
        llm_client::MODEL,
        limiter.min_interval().as_millis()
    );
    let llm: Arc<dyn CompletionService> =
        Arc::new(RateLimitedClient::new(Arc::new(client), limiter));

    let analyzer = Arc::new(ResumeAnalyzer::new(
        Arc::clone(&llm),
        Arc::clone(&store),
        config.analysis.clone(),
    ));

    // Build app state
    let state = AppState {
        analyzer,
        store,
        llm,
        config: config.clone(),
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
