// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt fragment that enforces a fixed plain-text layout.
pub const PLAIN_TEXT_SYSTEM: &str = "Respond in plain text only, following the requested \
    layout exactly. Do NOT use markdown headings, tables or code fences.";

/// Instruction shared by every prompt that sees resume content.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Base every statement on the resume text provided. \
    Do NOT invent employers, dates, degrees, certifications or metrics.";
