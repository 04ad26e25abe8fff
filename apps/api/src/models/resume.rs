use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::survey::{SurveyContext, UnknownChoice};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_key: String,
    pub original_filename: String,
    /// "pdf" | "image"
    pub file_kind: String,
    #[serde(skip_serializing)]
    pub extracted_text: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SurveyRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub target_role: String,
    pub experience_level: String,
    pub company_type: String,
    pub created_at: DateTime<Utc>,
}

impl SurveyRow {
    /// Rows are only ever written from a validated `SurveyContext`, so this only fails
    /// if the table was edited by hand.
    pub fn context(&self) -> Result<SurveyContext, UnknownChoice> {
        Ok(SurveyContext {
            target_role: self.target_role.parse()?,
            experience_level: self.experience_level.parse()?,
            company_type: self.company_type.parse()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub final_score: f64,
    /// See `scoring::evaluator::AnalysisOutcome`.
    pub outcome: String,
    pub full_analysis: Value,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRow {
    pub fn raw_analysis(&self) -> &str {
        self.full_analysis
            .get("raw_analysis")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneratedResumeRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub html_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
