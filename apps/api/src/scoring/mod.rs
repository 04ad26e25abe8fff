// ATS scoring: prompt building, reply parsing, and the evaluation orchestrator.
// All LLM calls go through llm_client::TextGenerator.

pub mod category;
pub mod evaluator;
pub mod parser;
pub mod prompts;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::scoring::category::{clamp_score, weighted_score, Breakdown, Category};

/// Normalized result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    pub weighted_score: f64,
    pub breakdown: Breakdown,
    pub raw_analysis: String,
}

/// A self-reported total line such as `Final Score: 91/100` or `**Overall ATS Score** - 88`.
static FINAL_SCORE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^([^\n]*?\b(?:final|overall|weighted)[ \t]+(?:ats[ \t]+)?(?:match[ \t]+)?score\b[^\n:\-]*[:\-][ \t*_]*)\d+(?:\.\d+)?(?:[ \t]*/[ \t]*100)?",
    )
    .unwrap()
});

impl AtsScore {
    /// No categories, score 0, explanatory text.
    pub fn zeroed(raw_analysis: impl Into<String>) -> Self {
        Self {
            weighted_score: 0.0,
            breakdown: Breakdown::new(),
            raw_analysis: raw_analysis.into(),
        }
    }

    /// Fills missing categories with 0, clamps each into [0, 100], computes the
    /// weighted score, and writes it over any total the model reported itself.
    pub fn from_breakdown(mut breakdown: Breakdown, raw_analysis: String) -> Self {
        for category in Category::ALL {
            let score = breakdown.get(&category).copied().unwrap_or(0.0);
            breakdown.insert(category, clamp_score(score));
        }
        let weighted_score = weighted_score(&breakdown);
        let raw_analysis = with_authoritative_total(&raw_analysis, weighted_score);
        Self {
            weighted_score,
            breakdown,
            raw_analysis,
        }
    }
}

fn with_authoritative_total(text: &str, score: f64) -> String {
    if FINAL_SCORE_LINE.is_match(text) {
        return FINAL_SCORE_LINE
            .replace_all(text, |caps: &Captures| format!("{}{score:.2}/100", &caps[1]))
            .into_owned();
    }
    let line = format!("Final Score: {score:.2}/100");
    if text.trim().is_empty() {
        line
    } else {
        format!("{}\n\n{line}", text.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_has_empty_breakdown() {
        let score = AtsScore::zeroed("No readable text found in resume.");
        assert_eq!(score.weighted_score, 0.0);
        assert!(score.breakdown.is_empty());
        assert_eq!(score.raw_analysis, "No readable text found in resume.");
    }

    #[test]
    fn test_from_breakdown_fills_all_categories() {
        let score = AtsScore::from_breakdown(
            Breakdown::from([(Category::Education, 50.0)]),
            String::new(),
        );
        assert_eq!(score.breakdown.len(), 4);
        assert_eq!(score.weighted_score, 10.0);
        assert_eq!(score.raw_analysis, "Final Score: 10.00/100");
    }

    #[test]
    fn test_total_override_variants() {
        for (line, expected) in [
            ("Final Score: 91", "Final Score: 42.00/100"),
            ("final score - 91/100", "final score - 42.00/100"),
            ("Overall ATS Score: 88.5 / 100", "Overall ATS Score: 42.00/100"),
            ("**Final Score:** 91", "**Final Score:** 42.00/100"),
            ("Weighted Match Score: 12", "Weighted Match Score: 42.00/100"),
        ] {
            assert_eq!(with_authoritative_total(line, 42.0), expected, "line: {line}");
        }
    }

    #[test]
    fn test_total_override_leaves_other_lines() {
        let text = "Skills look good.\nFinal Score: 99\nKeep the summary short.";
        assert_eq!(
            with_authoritative_total(text, 61.5),
            "Skills look good.\nFinal Score: 61.50/100\nKeep the summary short."
        );
    }

    #[test]
    fn test_total_override_is_stable() {
        let once = with_authoritative_total("Analysis text", 77.0);
        let twice = with_authoritative_total(&once, 77.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ats_score_json_shape() {
        let score = AtsScore::from_breakdown(Breakdown::new(), "x".to_string());
        let json = serde_json::to_value(&score).unwrap();
        assert!(json.get("weighted_score").is_some());
        assert!(json["breakdown"].get("hard_skills").is_some());
        assert!(json["raw_analysis"].is_string());
    }
}
