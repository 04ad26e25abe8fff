//! Resume persistence. Every query that takes a `user_id` scopes by owner, so another
//! user's resume is indistinguishable from a missing one.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::models::resume::{AnalysisRow, GeneratedResumeRow, ResumeRow, SurveyRow};
use crate::models::survey::SurveyContext;
use crate::scoring::category::clamp_score;
use crate::scoring::evaluator::Evaluation;

/// Parameters for inserting a new resume together with its survey.
pub struct NewResume<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_key: &'a str,
    pub original_filename: &'a str,
    pub file_kind: &'a str,
    pub extracted_text: &'a str,
    pub survey: &'a SurveyContext,
}

/// One line of the resume list.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub original_filename: String,
    pub file_kind: String,
    pub uploaded_at: DateTime<Utc>,
    pub latest_score: Option<f64>,
    pub latest_outcome: Option<String>,
}

/// Inserts the resume and its survey atomically: a survey never exists alone.
pub async fn insert_resume_with_survey(
    pool: &PgPool,
    new: NewResume<'_>,
) -> Result<(ResumeRow, SurveyRow)> {
    let mut tx = pool.begin().await?;

    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, file_key, original_filename, file_kind, extracted_text)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(new.id)
    .bind(new.user_id)
    .bind(new.file_key)
    .bind(new.original_filename)
    .bind(new.file_kind)
    .bind(new.extracted_text)
    .fetch_one(&mut *tx)
    .await?;

    let survey = sqlx::query_as::<_, SurveyRow>(
        r#"
        INSERT INTO resume_surveys (id, resume_id, target_role, experience_level, company_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.id)
    .bind(new.survey.target_role.key())
    .bind(new.survey.experience_level.key())
    .bind(new.survey.company_type.key())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Inserted resume {} for user {}", resume.id, resume.user_id);
    Ok((resume, survey))
}

pub async fn update_extracted_text(pool: &PgPool, resume_id: Uuid, text: &str) -> Result<()> {
    sqlx::query("UPDATE resumes SET extracted_text = $1 WHERE id = $2")
        .bind(text)
        .bind(resume_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Appends an analysis. Resumes keep their full analysis history; the newest is current.
pub async fn insert_analysis(
    pool: &PgPool,
    resume_id: Uuid,
    evaluation: &Evaluation,
) -> Result<AnalysisRow> {
    let full_analysis = serde_json::to_value(&evaluation.score)?;
    let row = sqlx::query_as::<_, AnalysisRow>(
        r#"
        INSERT INTO resume_analyses (id, resume_id, final_score, outcome, full_analysis)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(clamp_score(evaluation.score.weighted_score))
    .bind(evaluation.outcome.as_str())
    .bind(full_analysis)
    .fetch_one(pool)
    .await?;

    info!(
        "Stored analysis {} for resume {resume_id}: {} ({:.2})",
        row.id, row.outcome, row.final_score
    );
    Ok(row)
}

pub async fn list_resumes(pool: &PgPool, user_id: Uuid) -> Result<Vec<ResumeSummary>> {
    Ok(sqlx::query_as::<_, ResumeSummary>(
        r#"
        SELECT r.id, r.original_filename, r.file_kind, r.uploaded_at,
               a.final_score AS latest_score, a.outcome AS latest_outcome
        FROM resumes r
        LEFT JOIN LATERAL (
            SELECT final_score, outcome
            FROM resume_analyses
            WHERE resume_id = r.id
            ORDER BY created_at DESC
            LIMIT 1
        ) a ON TRUE
        WHERE r.user_id = $1
        ORDER BY r.uploaded_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_owned_resume(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Option<ResumeRow>> {
    Ok(
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(resume_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn get_survey(pool: &PgPool, resume_id: Uuid) -> Result<Option<SurveyRow>> {
    Ok(
        sqlx::query_as::<_, SurveyRow>("SELECT * FROM resume_surveys WHERE resume_id = $1")
            .bind(resume_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn latest_analysis(pool: &PgPool, resume_id: Uuid) -> Result<Option<AnalysisRow>> {
    Ok(sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM resume_analyses WHERE resume_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(resume_id)
    .fetch_optional(pool)
    .await?)
}

pub async fn analysis_history(pool: &PgPool, resume_id: Uuid) -> Result<Vec<AnalysisRow>> {
    Ok(sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM resume_analyses WHERE resume_id = $1 ORDER BY created_at DESC",
    )
    .bind(resume_id)
    .fetch_all(pool)
    .await?)
}

/// At most one generated resume per resume: regeneration overwrites it.
pub async fn upsert_generated_resume(
    pool: &PgPool,
    resume_id: Uuid,
    html_content: &str,
) -> Result<GeneratedResumeRow> {
    Ok(sqlx::query_as::<_, GeneratedResumeRow>(
        r#"
        INSERT INTO generated_resumes (id, resume_id, html_content)
        VALUES ($1, $2, $3)
        ON CONFLICT (resume_id)
        DO UPDATE SET html_content = EXCLUDED.html_content, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(html_content)
    .fetch_one(pool)
    .await?)
}

pub async fn get_generated_resume(
    pool: &PgPool,
    resume_id: Uuid,
) -> Result<Option<GeneratedResumeRow>> {
    Ok(sqlx::query_as::<_, GeneratedResumeRow>(
        "SELECT * FROM generated_resumes WHERE resume_id = $1",
    )
    .bind(resume_id)
    .fetch_optional(pool)
    .await?)
}

/// Deletes the resume; survey, analyses and generated content go with it via
/// `ON DELETE CASCADE`. Returns the stored file key so the object can be removed too.
pub async fn delete_owned_resume(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Option<String>> {
    Ok(sqlx::query_scalar::<_, String>(
        "DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING file_key",
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}
