/// System prompt for resume rewriting: enforces a bare HTML fragment.
pub const REWRITE_SYSTEM: &str = "You are an expert resume writer who produces concise, \
    ATS-friendly one-page resumes. You MUST respond with an HTML fragment only. \
    Do NOT include <html>, <head> or <body> tags. \
    Do NOT use markdown or code fences. \
    Do NOT include explanations.";

/// Rewrite prompt template.
/// Replace: {target_role}, {experience_level}, {company_type}, {no_invention},
///          {analysis}, then {resume_text} last.
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite the resume below for a {target_role} position
at a {company_type} company, for a candidate with experience level: {experience_level}.

Use the ATS analysis to fix the weak areas it found and to surface the skills it
marked as matched.

HARD RULES:
1. The whole resume must fit on ONE page: 150-200 words in total.
2. Use these sections in this exact order, each as an <h2>:
   Contact, Summary, Skills, Work, Projects, Education, and Awards only if the original has any.
3. Put the candidate's name in a single <h1> at the top, above Contact.
4. Use <ul><li> for bullet points, <p> for the summary. No inline styles, no scripts.
5. Omit a section entirely if the original resume has nothing for it.

{no_invention}

ATS ANALYSIS:
{analysis}

ORIGINAL RESUME:
{resume_text}"#;
