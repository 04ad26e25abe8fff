//! Resume Rewriting: asks the AI for a one-page HTML rewrite of the resume.
//!
//! The rewrite is best-effort: `rewrite_or_placeholder` never fails, it returns a
//! placeholder fragment when the AI is unavailable or replies with nothing usable.

pub mod prompts;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::{strip_code_fences, LlmError, TextGenerator};
use crate::models::survey::SurveyContext;
use crate::render::sanitize_fragment;
use crate::rewrite::prompts::{REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM};

pub const REWRITE_FAILED_HTML: &str = "<h2>Resume rewrite failed</h2>\
<p>We could not generate an optimized resume right now. Please try again later.</p>";

static BODY_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());

pub fn build_rewrite_prompt(resume_text: &str, survey: &SurveyContext, analysis: &str) -> String {
    let analysis = if analysis.trim().is_empty() {
        "(no prior analysis available)"
    } else {
        analysis
    };
    REWRITE_PROMPT_TEMPLATE
        .replace("{target_role}", survey.target_role.label())
        .replace("{experience_level}", survey.experience_level.label())
        .replace("{company_type}", survey.company_type.label())
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
        .replace("{analysis}", analysis)
        .replace("{resume_text}", resume_text)
}

/// One AI call; returns the cleaned fragment.
pub async fn rewrite_resume(
    llm: &dyn TextGenerator,
    resume_text: &str,
    survey: &SurveyContext,
    analysis: &str,
) -> Result<String, LlmError> {
    if !llm.is_configured() {
        return Err(LlmError::MissingApiKey);
    }
    let prompt = build_rewrite_prompt(resume_text, survey, analysis);
    let reply = llm.generate(&prompt, REWRITE_SYSTEM).await?;
    let fragment = clean_fragment(&reply);
    if fragment.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(fragment)
}

pub async fn rewrite_or_placeholder(
    llm: &dyn TextGenerator,
    resume_text: &str,
    survey: &SurveyContext,
    analysis: &str,
) -> String {
    match rewrite_resume(llm, resume_text, survey, analysis).await {
        Ok(fragment) => {
            info!("Resume rewritten ({} bytes of HTML)", fragment.len());
            fragment
        }
        Err(e) => {
            warn!("Resume rewrite failed: {e}");
            REWRITE_FAILED_HTML.to_string()
        }
    }
}

/// Strips code fences and, if the model sent a full page anyway, keeps only the body.
fn clean_fragment(reply: &str) -> String {
    let unfenced = strip_code_fences(reply);
    let inner = BODY_CONTENT
        .captures(unfenced)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(unfenced);
    sanitize_fragment(inner)
}
