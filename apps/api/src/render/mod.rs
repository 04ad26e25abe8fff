//! Document Rendering: wraps a resume fragment in the page template and renders PDF.
//!
//! Unlike the rest of the pipeline this stage does not degrade: an empty document is
//! never an acceptable output, so `assemble_document` refuses blank input.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

pub const DOCUMENT_FILENAME: &str = "optimized_resume.pdf";
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// A4 page, single column. Replace `{content}` with the resume fragment.
const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Optimized Resume</title>
<style>
  @page { size: A4; margin: 14mm 16mm; }
  body { font-family: "Helvetica Neue", Arial, sans-serif; font-size: 10.5pt; line-height: 1.35; color: #1a1a1a; }
  h1 { font-size: 20pt; margin: 0 0 4pt 0; }
  h2 { font-size: 11.5pt; text-transform: uppercase; letter-spacing: 0.5pt; border-bottom: 1px solid #888; margin: 10pt 0 4pt 0; padding-bottom: 2pt; }
  p { margin: 0 0 4pt 0; }
  ul { margin: 0 0 4pt 0; padding-left: 14pt; }
  li { margin: 0 0 2pt 0; }
</style>
</head>
<body>
{content}
</body>
</html>"#;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Generated resume content is empty; refusing to render an empty document")]
    EmptyDocument,

    #[error("Renderer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Renderer timed out after {0:?}")]
    Timeout(Duration),

    #[error("Renderer exited with status {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// HTML document to PDF bytes. Carried in `AppState` as `Arc<dyn DocumentRenderer>`.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Markup the resume layout needs. Everything else is dropped, and `script`/`style`
/// elements lose their content too.
const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "p", "ul", "ol", "li", "strong", "em", "b", "i", "a", "br", "span",
    "div",
];

/// Reduces AI-written HTML to the allowed tags, so nothing reaches the renderer that
/// could fetch a resource or run a script.
pub fn sanitize_fragment(fragment: &str) -> String {
    ammonia::Builder::default()
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .clean(fragment)
        .to_string()
        .trim()
        .to_string()
}

/// Sanitizes the fragment and wraps it in the page template.
pub fn assemble_document(fragment: &str) -> Result<String, RenderError> {
    let fragment = sanitize_fragment(fragment);
    if fragment.is_empty() {
        return Err(RenderError::EmptyDocument);
    }
    Ok(PAGE_TEMPLATE.replace("{content}", &fragment))
}

/// Assembles and renders in one step.
pub async fn render_resume(
    renderer: &dyn DocumentRenderer,
    fragment: &str,
) -> Result<Vec<u8>, RenderError> {
    let html = assemble_document(fragment)?;
    let pdf = renderer.render_pdf(&html).await?;
    info!("Rendered {} ({} bytes)", DOCUMENT_FILENAME, pdf.len());
    Ok(pdf)
}

/// Renders through the `wkhtmltopdf` command-line tool.
#[derive(Clone)]
pub struct WkhtmltopdfRenderer {
    pub executable_path: String,
    pub timeout: Duration,
}

impl WkhtmltopdfRenderer {
    pub fn new(executable_path: String, timeout: Duration) -> Self {
        Self {
            executable_path,
            timeout,
        }
    }

    fn command(&self, input_path: &Path, output_path: &Path) -> Command {
        let mut command = Command::new(&self.executable_path);
        command
            .arg("--quiet")
            .arg("--encoding")
            .arg("utf-8")
            .arg("--page-size")
            .arg("A4")
            .arg("--disable-javascript")
            .arg("--disable-local-file-access")
            .arg(input_path)
            .arg(output_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl DocumentRenderer for WkhtmltopdfRenderer {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let temp_dir = tempfile::Builder::new()
            .prefix("resumate-render-")
            .tempdir()?;

        let input_path: PathBuf = temp_dir.path().join("resume.html");
        let output_path: PathBuf = temp_dir.path().join(DOCUMENT_FILENAME);
        tokio::fs::write(&input_path, html).await?;

        let mut command = self.command(&input_path, &output_path);

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(tokio::fs::read(&output_path).await?)
    }
}
