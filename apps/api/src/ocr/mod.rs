//! OCR client for the OCR.Space-compatible web API.
//!
//! One POST per call, multipart body with the raw file plus `apikey` and
//! `language=eng`. A fixed wall-clock timeout applies; a timeout is a failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const OCR_TIMEOUT: Duration = Duration::from_secs(15);
const OCR_LANGUAGE: &str = "eng";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR_SPACE_API_KEY is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR service returned status {0}")]
    Status(u16),

    #[error("OCR service reported a processing error: {0}")]
    Processing(String),

    #[error("OCR response contained no parsed results")]
    NoResults,
}

/// Image-or-document to text. Carried in `AppState` as `Arc<dyn OcrEngine>`.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, bytes: &[u8], filename: &str) -> Result<String, OcrError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

#[derive(Clone)]
pub struct OcrSpaceClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OcrSpaceClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self, OcrError> {
        Ok(Self {
            client: Client::builder().timeout(OCR_TIMEOUT).build()?,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl OcrEngine for OcrSpaceClient {
    async fn recognize(&self, bytes: &[u8], filename: &str) -> Result<String, OcrError> {
        let api_key = self.api_key.clone().ok_or(OcrError::MissingApiKey)?;

        let form = Form::new()
            .part(
                "file",
                Part::bytes(bytes.to_vec()).file_name(filename.to_string()),
            )
            .text("apikey", api_key)
            .text("language", OCR_LANGUAGE);

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Status(status.as_u16()));
        }

        let body: OcrResponse = response.json().await?;
        let text = text_from_response(body)?;
        debug!("OCR returned {} characters for {filename}", text.len());
        Ok(text)
    }
}

fn text_from_response(body: OcrResponse) -> Result<String, OcrError> {
    if body.is_errored_on_processing {
        let message = match body.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "unknown error".to_string(),
        };
        return Err(OcrError::Processing(message));
    }

    body.parsed_results
        .and_then(|results| results.into_iter().next())
        .map(|first| first.parsed_text.trim().to_string())
        .ok_or(OcrError::NoResults)
}
