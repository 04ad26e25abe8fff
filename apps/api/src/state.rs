use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::auth::SessionStore;
use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::ocr::OcrEngine;
use crate::render::DocumentRenderer;
use crate::scoring::parser::ScoreParser;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub sessions: SessionStore,
    pub s3: S3Client,
    pub config: Config,
    /// Anthropic client by default. Unconfigured when no API key is set.
    pub llm: Arc<dyn TextGenerator>,
    pub ocr: Arc<dyn OcrEngine>,
    /// Chosen at startup via SCORE_PARSER.
    pub score_parser: Arc<dyn ScoreParser>,
    pub renderer: Arc<dyn DocumentRenderer>,
}
