//! Axum route handlers for the Resume API.

use std::future::Future;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extraction::{TextExtractor, UploadKind};
use crate::models::resume::ResumeRow;
use crate::models::survey::SurveyContext;
use crate::render::{render_resume, DOCUMENT_FILENAME};
use crate::resumes::storage::{
    content_type, delete_resume_file, fetch_resume_file, object_key, put_resume_file,
};
use crate::resumes::store::{self, NewResume};
use crate::resumes::upload::read_upload_fields;
use crate::rewrite::rewrite_or_placeholder;
use crate::scoring::evaluator::{Evaluation, ResumeEvaluator, NO_READABLE_TEXT_MESSAGE};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Upload & listing
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
///
/// Validates the upload, stores the file, extracts text, persists the resume with its
/// survey and stores the first analysis. AI and OCR failures still return 201 with a
/// zeroed analysis whose `outcome` says what went wrong.
pub async fn handle_upload(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let form = read_upload_fields(multipart).await?.validate()?;

    let resume_id = Uuid::new_v4();
    let key = object_key(user.id, resume_id, &form.extension);
    put_resume_file(
        &state.s3,
        &state.config.s3_bucket,
        &key,
        form.data.clone(),
        content_type(form.kind, &form.extension),
    )
    .await?;

    let text = TextExtractor::new(state.ocr.as_ref())
        .extract(&form.data, &form.filename, form.kind)
        .await;

    let inserted = store::insert_resume_with_survey(
        &state.db,
        NewResume {
            id: resume_id,
            user_id: user.id,
            file_key: &key,
            original_filename: &form.filename,
            file_kind: form.kind.as_str(),
            extracted_text: &text,
            survey: &form.survey,
        },
    )
    .await
    .map_err(AppError::Internal);
    // Without the row nothing references the object, so it goes too.
    let (resume, survey) = discard_on_error(
        inserted,
        delete_resume_file(&state.s3, &state.config.s3_bucket, &key),
    )
    .await?;

    let evaluation = evaluate(&state, &text, &form.survey).await;
    let analysis = store::insert_analysis(&state.db, resume.id, &evaluation)
        .await
        .map_err(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "resume": resume,
            "survey": survey,
            "analysis": analysis,
            "score": evaluation.score,
        })),
    ))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, AppError> {
    let resumes = store::list_resumes(&state.db, user.id)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(json!({ "resumes": resumes })))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let resume = load_owned(&state, &user, resume_id).await?;

    let survey = store::get_survey(&state.db, resume.id)
        .await
        .map_err(AppError::Internal)?;
    let history = store::analysis_history(&state.db, resume.id)
        .await
        .map_err(AppError::Internal)?;
    let generated = store::get_generated_resume(&state.db, resume.id)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({
        "resume": resume,
        "survey": survey,
        "latest_analysis": history.first(),
        "analyses": history,
        "has_generated_resume": generated.is_some(),
    })))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let key = store::delete_owned_resume(&state.db, user.id, resume_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(not_found)?;

    // The row is gone already; a stale object is only logged.
    if let Err(e) = delete_resume_file(&state.s3, &state.config.s3_bucket, &key).await {
        warn!("Resume {resume_id} deleted but its file was not: {e}");
    }

    info!("User {} deleted resume {resume_id}", user.username);
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis & generation
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/:id/analyses
///
/// Evaluates the stored text again and appends a new analysis record. If the stored
/// text is empty the original file is fetched and extracted once more first.
pub async fn handle_reanalyze(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(resume_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let resume = load_owned(&state, &user, resume_id).await?;
    let survey = load_survey(&state, resume.id).await?;

    let text = if resume.extracted_text.trim().is_empty() {
        let text = reextract(&state, &resume).await?;
        if !text.is_empty() {
            store::update_extracted_text(&state.db, resume.id, &text)
                .await
                .map_err(AppError::Internal)?;
        }
        text
    } else {
        resume.extracted_text.clone()
    };

    let evaluation = evaluate(&state, &text, &survey).await;
    let analysis = store::insert_analysis(&state.db, resume.id, &evaluation)
        .await
        .map_err(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "analysis": analysis, "score": evaluation.score })),
    ))
}

/// POST /api/v1/resumes/:id/generate
///
/// Rewrites the resume against its survey and latest analysis, stores the HTML
/// (replacing any earlier version) and returns the rendered PDF.
pub async fn handle_generate(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(resume_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let resume = load_owned(&state, &user, resume_id).await?;
    if resume.extracted_text.trim().is_empty() {
        return Err(AppError::Validation(NO_READABLE_TEXT_MESSAGE.to_string()));
    }
    let survey = load_survey(&state, resume.id).await?;

    let latest = store::latest_analysis(&state.db, resume.id)
        .await
        .map_err(AppError::Internal)?;
    let analysis = latest.as_ref().map(|a| a.raw_analysis()).unwrap_or_default();

    let html = rewrite_or_placeholder(
        state.llm.as_ref(),
        &resume.extracted_text,
        &survey,
        analysis,
    )
    .await;
    store::upsert_generated_resume(&state.db, resume.id, &html)
        .await
        .map_err(AppError::Internal)?;

    let pdf = render_resume(state.renderer.as_ref(), &html).await?;
    Ok(pdf_attachment(pdf))
}

/// GET /api/v1/resumes/:id/document
pub async fn handle_get_document(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(resume_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let resume = load_owned(&state, &user, resume_id).await?;
    let generated = store::get_generated_resume(&state.db, resume.id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("No generated resume yet".to_string()))?;

    let pdf = render_resume(state.renderer.as_ref(), &generated.html_content).await?;
    Ok(pdf_attachment(pdf))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn not_found() -> AppError {
    AppError::NotFound("Resume not found".to_string())
}

async fn load_owned(
    state: &AppState,
    user: &CurrentUser,
    resume_id: Uuid,
) -> Result<ResumeRow, AppError> {
    store::get_owned_resume(&state.db, user.id, resume_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(not_found)
}

async fn load_survey(state: &AppState, resume_id: Uuid) -> Result<SurveyContext, AppError> {
    let row = store::get_survey(&state.db, resume_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("resume {resume_id} has no survey"))
        })?;
    row.context().map_err(|e| AppError::Internal(e.into()))
}

async fn evaluate(state: &AppState, text: &str, survey: &SurveyContext) -> Evaluation {
    ResumeEvaluator::new(state.llm.as_ref(), state.score_parser.as_ref())
        .evaluate_or_fallback(text, survey)
        .await
}

async fn reextract(state: &AppState, resume: &ResumeRow) -> Result<String, AppError> {
    let kind = UploadKind::from_filename(&resume.original_filename).unwrap_or(
        if resume.file_kind == UploadKind::Image.as_str() {
            UploadKind::Image
        } else {
            UploadKind::Pdf
        },
    );
    let data = fetch_resume_file(&state.s3, &state.config.s3_bucket, &resume.file_key).await?;
    Ok(TextExtractor::new(state.ocr.as_ref())
        .extract(&data, &resume.original_filename, kind)
        .await)
}

/// Runs `cleanup` only when `result` is an error. A failing cleanup is logged and the
/// original error is returned.
async fn discard_on_error<T, C>(result: Result<T, AppError>, cleanup: C) -> Result<T, AppError>
where
    C: Future<Output = Result<(), AppError>>,
{
    if result.is_err() {
        if let Err(e) = cleanup.await {
            warn!("Cleanup after failed upload also failed: {e}");
        }
    }
    result
}

fn pdf_attachment(pdf: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{DOCUMENT_FILENAME}\"");
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response()
}
