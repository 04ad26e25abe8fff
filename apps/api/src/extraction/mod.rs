//! Text Extraction: turns an uploaded resume file into plain text.
//!
//! PDFs go through the native text layer first; when that yields fewer than
//! `MIN_READABLE_CHARS` characters (scanned documents) or the upload is an image,
//! a single OCR call is made. Extraction never fails: every error is logged and
//! becomes an empty string, which callers detect with `trim().is_empty()`.

use std::path::Path;

use tracing::{info, warn};

use crate::ocr::OcrEngine;

/// Native text shorter than this (after trimming) is treated as unreadable.
pub const MIN_READABLE_CHARS: usize = 100;

/// The kinds of upload the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Image,
}

impl UploadKind {
    /// Classifies a filename by extension. Anything other than
    /// `.pdf`, `.jpg`, `.jpeg` or `.png` (any case) is rejected.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(UploadKind::Pdf),
            "jpg" | "jpeg" | "png" => Some(UploadKind::Image),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Pdf => "pdf",
            UploadKind::Image => "image",
        }
    }
}

pub struct TextExtractor<'a> {
    ocr: &'a dyn OcrEngine,
}

impl<'a> TextExtractor<'a> {
    pub fn new(ocr: &'a dyn OcrEngine) -> Self {
        Self { ocr }
    }

    pub async fn extract(&self, bytes: &[u8], filename: &str, kind: UploadKind) -> String {
        let text = match kind {
            UploadKind::Image => self.ocr_or_empty(bytes, filename).await,
            UploadKind::Pdf => {
                let native = native_pdf_text(bytes).await;
                if needs_ocr(&native) {
                    info!(
                        "Native PDF text too short ({} chars) for {filename}, falling back to OCR",
                        native.trim().chars().count()
                    );
                    let ocr_text = self.ocr_or_empty(bytes, filename).await;
                    if ocr_text.trim().is_empty() {
                        native
                    } else {
                        ocr_text
                    }
                } else {
                    native
                }
            }
        };

        let text = clean_text(&text);
        info!("Extracted {} characters from {filename}", text.chars().count());
        text
    }

    async fn ocr_or_empty(&self, bytes: &[u8], filename: &str) -> String {
        match self.ocr.recognize(bytes, filename).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR failed for {filename}: {e}");
                String::new()
            }
        }
    }
}

pub fn needs_ocr(native_text: &str) -> bool {
    native_text.trim().chars().count() < MIN_READABLE_CHARS
}

/// Drops NUL and other non-whitespace control characters (Postgres `TEXT` rejects
/// `\0`), then trims.
pub fn clean_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Runs the PDF text-layer parser on the blocking pool. Parser errors and panics
/// both come back as an empty string.
async fn native_pdf_text(bytes: &[u8]) -> String {
    let owned = bytes.to_vec();
    match tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Native PDF extraction failed: {e}");
            String::new()
        }
        Err(e) => {
            warn!("Native PDF extraction aborted: {e}");
            String::new()
        }
    }
}
