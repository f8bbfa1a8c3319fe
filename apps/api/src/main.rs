mod config;
mod db;
mod embedding_client;
mod errors;
mod evaluation;
mod integrity;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::embedding_client::EmbeddingClient;
use crate::evaluation::evaluator::AnswerEvaluator;
use crate::evaluation::repository::PgEvaluationRepository;
use crate::evaluation::similarity::EmbeddingSimilarity;
use crate::integrity::tracker::IntegrityTracker;
use crate::routes::build_router;
use crate::state::AppState;

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

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize embedding client
    let embeddings = EmbeddingClient::new(
        config.embedding_api_url.clone(),
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
        config.similarity_timeout(),
    )
    .context("Failed to build embedding HTTP client")?;
    info!("Embedding client initialized (model: {})", embeddings.model());

    let evaluator = AnswerEvaluator::new(
        Arc::new(EmbeddingSimilarity(embeddings)),
        config.evaluation_config(),
    );

    let state = AppState {
        tracker: Arc::new(IntegrityTracker::new(config.integrity_config())),
        evaluator: Arc::new(evaluator),
        evaluations: Arc::new(PgEvaluationRepository::new(db)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the interview frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
