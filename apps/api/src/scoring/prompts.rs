//! Evaluation prompt building. Pure functions: same inputs, same string.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION, PLAIN_TEXT_SYSTEM};
use crate::models::survey::SurveyContext;
use crate::scoring::category::Category;
use crate::scoring::parser::ParserKind;

const EVALUATOR_ROLE: &str = "You are an Applicant Tracking System (ATS) used by leading \
    technology companies. You evaluate resumes strictly, objectively and without generic praise.";

/// Evaluation prompt template.
/// Replace: {target_role}, {experience_level}, {company_type}, {rubric},
///          {output_layout}, {no_invention}, then {resume_text} last.
const EVALUATION_PROMPT_TEMPLATE: &str = r#"The candidate is targeting the role of: {target_role}.
Experience level: {experience_level}.
Target company type: {company_type}.

Use widely accepted industry expectations for this role, level and company type
within the Computer Science domain.

Score the resume from 0 to 100 in each of these categories:
{rubric}

{no_invention}

{output_layout}

Resume:
{resume_text}"#;

const JSON_LAYOUT: &str = r#"Return a JSON object with this EXACT schema (no extra fields):
{
  "weighted_score": 0,
  "breakdown": {
    "hard_skills": 0,
    "job_title_match": 0,
    "education": 0,
    "formatting": 0
  },
  "raw_analysis": "Matched skills, missing skills, weak alignment areas and improvement recommendations as plain text."
}
Every breakdown value is a number from 0 to 100."#;

const PLAIN_TEXT_LAYOUT_HEADER: &str =
    "Return your evaluation in EXACTLY this layout, one category per line, numbers from 0 to 100:";

const PLAIN_TEXT_LAYOUT_FOOTER: &str = "Final Score: <number>/100

Matched skills:
Missing skills:
Weak alignment areas:
Improvement recommendations:";

pub fn evaluation_system_prompt(kind: ParserKind) -> String {
    let format_rule = match kind {
        ParserKind::Json => JSON_ONLY_SYSTEM,
        ParserKind::Regex => PLAIN_TEXT_SYSTEM,
    };
    format!("{EVALUATOR_ROLE} {format_rule}")
}

pub fn build_evaluation_prompt(resume_text: &str, survey: &SurveyContext, kind: ParserKind) -> String {
    let layout = match kind {
        ParserKind::Json => JSON_LAYOUT.to_string(),
        ParserKind::Regex => plain_text_layout(),
    };

    EVALUATION_PROMPT_TEMPLATE
        .replace("{target_role}", survey.target_role.label())
        .replace("{experience_level}", survey.experience_level.label())
        .replace("{company_type}", survey.company_type.label())
        .replace("{rubric}", &rubric())
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
        .replace("{output_layout}", &layout)
        // Last, so placeholders inside the resume itself are never expanded.
        .replace("{resume_text}", resume_text)
}

fn rubric() -> String {
    Category::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {} ({:.0}%)",
                i + 1,
                c.display_name(),
                c.weight() * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn plain_text_layout() -> String {
    let lines = Category::ALL
        .iter()
        .map(|c| format!("{}: <number>", c.display_name()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{PLAIN_TEXT_LAYOUT_HEADER}\n{lines}\n{PLAIN_TEXT_LAYOUT_FOOTER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::survey::{CompanyType, ExperienceLevel, TargetRole};

    fn survey() -> SurveyContext {
        SurveyContext {
            target_role: TargetRole::Backend,
            experience_level: ExperienceLevel::Junior,
            company_type: CompanyType::Startup,
        }
    }

    const RESUME: &str = "Jane Doe\nRust, PostgreSQL, Kubernetes\nBSc Computer Science";

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_evaluation_prompt(RESUME, &survey(), ParserKind::Json);
        let b = build_evaluation_prompt(RESUME, &survey(), ParserKind::Json);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_embeds_resume_at_end() {
        let prompt = build_evaluation_prompt(RESUME, &survey(), ParserKind::Regex);
        assert!(prompt.ends_with(RESUME));
    }

    #[test]
    fn test_prompt_uses_survey_labels() {
        let prompt = build_evaluation_prompt(RESUME, &survey(), ParserKind::Json);
        assert!(prompt.contains("Backend Developer"));
        assert!(prompt.contains("1-3 Years"));
        assert!(prompt.contains("Startup"));
    }

    #[test]
    fn test_prompt_lists_weighted_rubric() {
        let prompt = build_evaluation_prompt(RESUME, &survey(), ParserKind::Json);
        assert!(prompt.contains("1. Hard Skills & Keywords (40%)"));
        assert!(prompt.contains("2. Job Title & Level Matching (30%)"));
        assert!(prompt.contains("3. Education & Certifications (20%)"));
        assert!(prompt.contains("4. Formatting & Parseability (10%)"));
    }

    #[test]
    fn test_json_layout_names_required_keys() {
        let prompt = build_evaluation_prompt(RESUME, &survey(), ParserKind::Json);
        for key in ["\"weighted_score\"", "\"breakdown\"", "\"raw_analysis\"", "\"job_title_match\""] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_plain_layout_has_category_lines() {
        let prompt = build_evaluation_prompt(RESUME, &survey(), ParserKind::Regex);
        assert!(prompt.contains("Hard Skills & Keywords: <number>"));
        assert!(prompt.contains("Formatting & Parseability: <number>"));
        assert!(!prompt.contains("\"breakdown\""));
    }

    #[test]
    fn test_resume_placeholders_are_not_expanded() {
        let resume = "Objective: {target_role} anywhere";
        let prompt = build_evaluation_prompt(resume, &survey(), ParserKind::Json);
        assert!(prompt.ends_with("Objective: {target_role} anywhere"));
    }

    #[test]
    fn test_system_prompt_matches_parser() {
        assert!(evaluation_system_prompt(ParserKind::Json).contains("valid JSON only"));
        assert!(evaluation_system_prompt(ParserKind::Regex).contains("plain text only"));
        assert!(evaluation_system_prompt(ParserKind::Json).contains("Applicant Tracking System"));
    }
}
