mod auth;
mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod ocr;
mod render;
mod resumes;
mod rewrite;
mod routes;
mod scoring;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::SessionStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::ocr::OcrSpaceClient;
use crate::render::{WkhtmltopdfRenderer, RENDER_TIMEOUT};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resumate API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed sessions
    let redis = redis::Client::open(config.redis_url.clone())?;
    let sessions = SessionStore::new(redis, config.session_ttl_secs);
    info!("Session store initialized (ttl {}s)", config.session_ttl_secs);

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize AI client. A missing key degrades evaluation, it does not block startup.
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("ANTHROPIC_API_KEY not set: analyses will be stored as not configured");
    }

    let ocr = OcrSpaceClient::new(config.ocr_endpoint.clone(), config.ocr_api_key.clone())?;
    if config.ocr_api_key.is_none() {
        warn!("OCR_SPACE_API_KEY not set: scanned resumes will yield no text");
    }

    let score_parser = config.score_parser.build();
    info!("Score parser: {:?}", config.score_parser);

    let renderer = WkhtmltopdfRenderer::new(config.wkhtmltopdf_path.clone(), RENDER_TIMEOUT);

    // Build app state
    let state = AppState {
        db,
        sessions,
        s3,
        config: config.clone(),
        llm: Arc::new(llm),
        ocr: Arc::new(ocr),
        score_parser,
        renderer: Arc::new(renderer),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumate-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
