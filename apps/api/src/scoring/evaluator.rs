//! Resume Evaluation: orchestrates prompt → AI call → parse.
//!
//! Flow: check text → check credential → build prompt → one AI call → ScoreParser.
//!
//! Every failure is a typed `AnalysisFailure` rather than a silent zero. Callers that
//! must always produce a record use `AnalysisFailure::fallback()` and store the
//! `outcome()` next to it, so "scored zero" and "could not score" stay distinguishable.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::TextGenerator;
use crate::models::survey::SurveyContext;
use crate::scoring::parser::ScoreParser;
use crate::scoring::prompts::{build_evaluation_prompt, evaluation_system_prompt};
use crate::scoring::AtsScore;

pub const NO_READABLE_TEXT_MESSAGE: &str = "No readable text found in resume.";
pub const NOT_CONFIGURED_MESSAGE: &str =
    "AI scoring is not configured: the ANTHROPIC_API_KEY credential is missing.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisFailure {
    #[error("No readable text found in resume.")]
    NoReadableText,

    #[error("AI scoring is not configured: the ANTHROPIC_API_KEY credential is missing.")]
    NotConfigured,

    #[error("AI analysis failed: {0}")]
    ServiceFailed(String),

    #[error("AI reply could not be parsed: {reason}")]
    MalformedOutput { reason: String, raw: String },
}

/// Stored alongside every analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Scored,
    NoReadableText,
    NotConfigured,
    ServiceFailed,
    MalformedOutput,
}

impl AnalysisOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisOutcome::Scored => "scored",
            AnalysisOutcome::NoReadableText => "no_readable_text",
            AnalysisOutcome::NotConfigured => "not_configured",
            AnalysisOutcome::ServiceFailed => "service_failed",
            AnalysisOutcome::MalformedOutput => "malformed_output",
        }
    }
}

impl AnalysisFailure {
    pub fn outcome(&self) -> AnalysisOutcome {
        match self {
            AnalysisFailure::NoReadableText => AnalysisOutcome::NoReadableText,
            AnalysisFailure::NotConfigured => AnalysisOutcome::NotConfigured,
            AnalysisFailure::ServiceFailed(_) => AnalysisOutcome::ServiceFailed,
            AnalysisFailure::MalformedOutput { .. } => AnalysisOutcome::MalformedOutput,
        }
    }

    /// The zeroed score shown to the user in place of a real evaluation.
    /// A malformed reply keeps the model's raw text so nothing is lost.
    pub fn fallback(&self) -> AtsScore {
        match self {
            AnalysisFailure::MalformedOutput { raw, .. } => AtsScore::zeroed(raw.clone()),
            other => AtsScore::zeroed(other.to_string()),
        }
    }
}

/// An evaluation that always has something to store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub outcome: AnalysisOutcome,
    pub score: AtsScore,
}

impl From<Result<AtsScore, AnalysisFailure>> for Evaluation {
    fn from(result: Result<AtsScore, AnalysisFailure>) -> Self {
        match result {
            Ok(score) => Evaluation {
                outcome: AnalysisOutcome::Scored,
                score,
            },
            Err(failure) => Evaluation {
                outcome: failure.outcome(),
                score: failure.fallback(),
            },
        }
    }
}

pub struct ResumeEvaluator<'a> {
    llm: &'a dyn TextGenerator,
    parser: &'a dyn ScoreParser,
}

impl<'a> ResumeEvaluator<'a> {
    pub fn new(llm: &'a dyn TextGenerator, parser: &'a dyn ScoreParser) -> Self {
        Self { llm, parser }
    }

    /// Makes at most one AI call. None at all for empty text or a missing credential.
    pub async fn evaluate(
        &self,
        resume_text: &str,
        survey: &SurveyContext,
    ) -> Result<AtsScore, AnalysisFailure> {
        if resume_text.trim().is_empty() {
            return Err(AnalysisFailure::NoReadableText);
        }
        if !self.llm.is_configured() {
            warn!("Skipping AI evaluation: no API credential configured");
            return Err(AnalysisFailure::NotConfigured);
        }

        let kind = self.parser.kind();
        let prompt = build_evaluation_prompt(resume_text, survey, kind);
        let system = evaluation_system_prompt(kind);

        let reply = self.llm.generate(&prompt, &system).await.map_err(|e| {
            warn!("AI evaluation call failed: {e}");
            AnalysisFailure::ServiceFailed(e.to_string())
        })?;

        let score = self.parser.parse(&reply).map_err(|malformed| {
            warn!("AI evaluation reply malformed: {}", malformed.reason);
            AnalysisFailure::MalformedOutput {
                reason: malformed.reason,
                raw: malformed.raw,
            }
        })?;

        info!(
            "Resume scored {:.2}/100 for {}",
            score.weighted_score, survey.target_role
        );
        Ok(score)
    }

    /// `evaluate`, folded into something that can always be persisted.
    pub async fn evaluate_or_fallback(&self, resume_text: &str, survey: &SurveyContext) -> Evaluation {
        self.evaluate(resume_text, survey).await.into()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::survey::{CompanyType, ExperienceLevel, TargetRole};
    use crate::scoring::category::Category;
    use crate::scoring::parser::{JsonScoreParser, RegexScoreParser};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test double for the AI client that records how often it was called.
    pub(crate) struct ScriptedLlm {
        configured: bool,
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                configured: true,
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                configured: true,
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn unconfigured() -> Self {
            Self {
                configured: false,
                reply: Err("unreachable".to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedLlm {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|message| LlmError::Api {
                status: 500,
                message,
            })
        }
    }

    fn survey() -> SurveyContext {
        SurveyContext {
            target_role: TargetRole::Ml,
            experience_level: ExperienceLevel::Fresher,
            company_type: CompanyType::Faang,
        }
    }

    const JSON_REPLY: &str = r#"{"weighted_score": 50,
        "breakdown": {"hard_skills": 80, "job_title_match": 70, "education": 90, "formatting": 60},
        "raw_analysis": "Solid fundamentals."}"#;

    #[tokio::test]
    async fn test_empty_text_makes_no_ai_call() {
        let llm = ScriptedLlm::replying(JSON_REPLY);
        let evaluator = ResumeEvaluator::new(&llm, &JsonScoreParser);

        let evaluation = evaluator.evaluate_or_fallback("  \n\t ", &survey()).await;

        assert_eq!(llm.calls(), 0);
        assert_eq!(evaluation.outcome, AnalysisOutcome::NoReadableText);
        assert_eq!(evaluation.score, AtsScore::zeroed("No readable text found in resume."));
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_ai_call() {
        let llm = ScriptedLlm::unconfigured();
        let evaluator = ResumeEvaluator::new(&llm, &JsonScoreParser);

        let evaluation = evaluator.evaluate_or_fallback("Jane Doe, Rust", &survey()).await;

        assert_eq!(llm.calls(), 0);
        assert_eq!(evaluation.outcome, AnalysisOutcome::NotConfigured);
        assert_eq!(evaluation.score.weighted_score, 0.0);
        assert!(evaluation.score.breakdown.is_empty());
        assert_eq!(evaluation.score.raw_analysis, NOT_CONFIGURED_MESSAGE);
    }

    #[tokio::test]
    async fn test_successful_json_evaluation() {
        let llm = ScriptedLlm::replying(JSON_REPLY);
        let evaluator = ResumeEvaluator::new(&llm, &JsonScoreParser);

        let score = evaluator.evaluate("Jane Doe, Rust", &survey()).await.unwrap();

        assert_eq!(llm.calls(), 1);
        assert_eq!(score.weighted_score, 77.0);
        assert_eq!(score.breakdown[&Category::Education], 90.0);
    }

    #[tokio::test]
    async fn test_service_failure_is_typed_and_zeroed() {
        let llm = ScriptedLlm::failing("overloaded");
        let evaluator = ResumeEvaluator::new(&llm, &RegexScoreParser);

        let result = evaluator.evaluate("Jane Doe, Rust", &survey()).await;
        let failure = result.unwrap_err();
        assert_eq!(failure.outcome(), AnalysisOutcome::ServiceFailed);
        assert_eq!(llm.calls(), 1);

        let fallback = failure.fallback();
        assert_eq!(fallback.weighted_score, 0.0);
        assert!(fallback.raw_analysis.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_malformed_reply_keeps_raw_text() {
        let llm = ScriptedLlm::replying("I am unable to comply.");
        let evaluator = ResumeEvaluator::new(&llm, &JsonScoreParser);

        let evaluation = evaluator.evaluate_or_fallback("Jane Doe, Rust", &survey()).await;

        assert_eq!(evaluation.outcome, AnalysisOutcome::MalformedOutput);
        assert_eq!(evaluation.score, AtsScore::zeroed("I am unable to comply."));
    }

    #[tokio::test]
    async fn test_regex_strategy_end_to_end() {
        let llm = ScriptedLlm::replying(
            "Hard Skills & Keywords: 85/100\nJob Title & Level Matching: 60\n\
             Education & Certifications: 70\nFormatting & Parseability: 90\nFinal Score: 99",
        );
        let evaluator = ResumeEvaluator::new(&llm, &RegexScoreParser);

        let evaluation = evaluator.evaluate_or_fallback("Jane Doe, Rust", &survey()).await;

        // 34 + 18 + 14 + 9
        assert_eq!(evaluation.outcome, AnalysisOutcome::Scored);
        assert_eq!(evaluation.score.weighted_score, 75.0);
        assert!(evaluation.score.raw_analysis.contains("Final Score: 75.00/100"));
    }

    #[test]
    fn test_failure_messages_match_constants() {
        assert_eq!(AnalysisFailure::NoReadableText.to_string(), NO_READABLE_TEXT_MESSAGE);
        assert_eq!(AnalysisFailure::NotConfigured.to_string(), NOT_CONFIGURED_MESSAGE);
    }

    #[test]
    fn test_outcome_tags() {
        assert_eq!(AnalysisOutcome::Scored.as_str(), "scored");
        assert_eq!(AnalysisFailure::NotConfigured.outcome().as_str(), "not_configured");
        assert_eq!(
            serde_json::to_string(&AnalysisOutcome::MalformedOutput).unwrap(),
            r#""malformed_output""#
        );
    }
}
