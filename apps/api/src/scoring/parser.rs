//! Score Parsing: pluggable strategies that turn the model's reply into an `AtsScore`.
//!
//! Upstream output format is not fully under our control, so two backends exist:
//! - `JsonScoreParser`: expects `{weighted_score, breakdown, raw_analysis}`.
//! - `RegexScoreParser`: scans free text for `Category: number` lines.
//!
//! Both end in `AtsScore::from_breakdown`, which recomputes the weighted score.
//! `AppState` holds an `Arc<dyn ScoreParser>`, chosen at startup via `SCORE_PARSER`.

use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::strip_code_fences;
use crate::scoring::category::{Breakdown, Category};
use crate::scoring::AtsScore;

/// The model's reply could not be read by the active strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedOutput {
    pub reason: String,
    pub raw: String,
}

pub trait ScoreParser: Send + Sync {
    fn kind(&self) -> ParserKind;

    fn parse(&self, raw: &str) -> Result<AtsScore, MalformedOutput>;

    /// Never fails: malformed replies become a zeroed score carrying the raw text.
    fn parse_or_zeroed(&self, raw: &str) -> AtsScore {
        self.parse(raw)
            .unwrap_or_else(|malformed| AtsScore::zeroed(malformed.raw))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParserKind {
    #[default]
    Json,
    Regex,
}

impl ParserKind {
    pub fn build(self) -> Arc<dyn ScoreParser> {
        match self {
            ParserKind::Json => Arc::new(JsonScoreParser),
            ParserKind::Regex => Arc::new(RegexScoreParser),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown score parser '{0}'")]
pub struct UnknownParserKind(pub String);

impl FromStr for ParserKind {
    type Err = UnknownParserKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ParserKind::Json),
            "regex" | "text" => Ok(ParserKind::Regex),
            other => Err(UnknownParserKind(other.to_string())),
        }
    }
}

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// JSON strategy
// ────────────────────────────────────────────────────────────────────────────

pub struct JsonScoreParser;

const REQUIRED_KEYS: [&str; 3] = ["weighted_score", "breakdown", "raw_analysis"];

impl ScoreParser for JsonScoreParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Json
    }

    fn parse(&self, raw: &str) -> Result<AtsScore, MalformedOutput> {
        let malformed = |reason: String| MalformedOutput {
            reason,
            raw: raw.to_string(),
        };

        let value: Value = serde_json::from_str(strip_code_fences(raw))
            .map_err(|e| malformed(format!("reply is not valid JSON: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| malformed("reply is not a JSON object".to_string()))?;

        if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
            return Err(malformed(format!("reply is missing '{missing}'")));
        }

        let breakdown = object["breakdown"]
            .as_object()
            .map(breakdown_from_json)
            .ok_or_else(|| malformed("'breakdown' is not an object".to_string()))?;

        let raw_analysis = match &object["raw_analysis"] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        // The model's own weighted_score is ignored; from_breakdown recomputes it.
        Ok(AtsScore::from_breakdown(breakdown, raw_analysis))
    }
}

fn breakdown_from_json(map: &Map<String, Value>) -> Breakdown {
    map.iter()
        .filter_map(|(label, value)| {
            let category = Category::from_label(label)?;
            Some((category, json_score(value)?))
        })
        .collect()
}

/// Accepts `85`, `"85"`, `"85/100"` or `{"score": 85, ...}`.
fn json_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => FIRST_NUMBER.find(s).and_then(|m| m.as_str().parse().ok()),
        Value::Object(o) => o.get("score").and_then(json_score),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Regex strategy
// ────────────────────────────────────────────────────────────────────────────

pub struct RegexScoreParser;

/// `<category name> <':' or '-'> <number>` with an optional `/100`, any case. Markdown
/// emphasis and an echoed weight such as `(40%)` may sit between name and number.
static CATEGORY_PATTERNS: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    Category::ALL
        .into_iter()
        .map(|category| {
            let name = category
                .display_name()
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            let pattern = format!(
                r"(?i){name}[*_\s]*(?:\(\s*\d+(?:\.\d+)?\s*%\s*\))?[*_\s]*[:\-][*_\s]*(\d+(?:\.\d+)?)(?:\s*/\s*100)?"
            );
            (category, Regex::new(&pattern).unwrap())
        })
        .collect()
});

impl ScoreParser for RegexScoreParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Regex
    }

    fn parse(&self, raw: &str) -> Result<AtsScore, MalformedOutput> {
        let breakdown = CATEGORY_PATTERNS
            .iter()
            .filter_map(|(category, pattern)| {
                let score = pattern
                    .captures(raw)
                    .and_then(|caps| caps[1].parse::<f64>().ok())
                    .or_else(|| first_number_on_line_mentioning(raw, *category))?;
                Some((*category, score))
            })
            .collect();

        Ok(AtsScore::from_breakdown(breakdown, raw.trim().to_string()))
    }
}

fn first_number_on_line_mentioning(text: &str, category: Category) -> Option<f64> {
    let needle = category.display_name().to_lowercase();
    text.lines()
        .filter(|line| line.to_lowercase().contains(&needle))
        .find_map(|line| FIRST_NUMBER.find(line))
        .and_then(|m| m.as_str().parse().ok())
}
