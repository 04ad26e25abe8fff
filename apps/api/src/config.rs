use anyhow::{Context, Result};

use crate::scoring::parser::ParserKind;

const DEFAULT_OCR_ENDPOINT: &str = "https://api.ocr.space/parse/image";
/// Two weeks, matching the usual web-framework session lifetime.
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 14;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing. The AI and OCR keys are
/// optional: without them the pipeline degrades instead of refusing to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: Option<String>,
    pub ocr_api_key: Option<String>,
    pub ocr_endpoint: String,
    pub score_parser: ParserKind,
    pub wkhtmltopdf_path: String,
    pub session_ttl_secs: u64,
    pub cookie_secure: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            ocr_api_key: optional_env("OCR_SPACE_API_KEY"),
            ocr_endpoint: optional_env("OCR_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_OCR_ENDPOINT.to_string()),
            score_parser: score_parser_from(optional_env("SCORE_PARSER"))?,
            wkhtmltopdf_path: optional_env("WKHTMLTOPDF_PATH")
                .unwrap_or_else(|| "wkhtmltopdf".to_string()),
            session_ttl_secs: optional_env("SESSION_TTL_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("SESSION_TTL_SECS must be a positive integer")?
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
            cookie_secure: optional_env("COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn score_parser_from(value: Option<String>) -> Result<ParserKind> {
    Ok(value
        .map(|v| v.parse::<ParserKind>())
        .transpose()
        .context("SCORE_PARSER must be 'json' or 'regex'")?
        .unwrap_or_default())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
