//! Multipart upload parsing and validation.
//!
//! Everything here runs before any storage, OCR or AI call: a rejected upload leaves
//! no trace.

use std::path::Path;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;
use crate::extraction::UploadKind;
use crate::models::survey::{CompanyType, ExperienceLevel, SurveyContext, TargetRole};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const FILE_FIELDS: [&str; 2] = ["resume", "file"];

/// Raw form fields as received, before validation.
#[derive(Debug, Default)]
pub struct UploadFields {
    pub filename: Option<String>,
    pub data: Option<Bytes>,
    pub target_role: Option<String>,
    pub experience_level: Option<String>,
    pub company_type: Option<String>,
}

/// A validated upload.
#[derive(Debug)]
pub struct UploadForm {
    pub filename: String,
    pub extension: String,
    pub data: Bytes,
    pub kind: UploadKind,
    pub survey: SurveyContext,
}

pub async fn read_upload_fields(mut multipart: Multipart) -> Result<UploadFields, AppError> {
    let mut fields = UploadFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if FILE_FIELDS.contains(&name.as_str()) {
            fields.filename = field.file_name().map(str::to_string);
            fields.data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file: {e}")))?,
            );
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
        match name.as_str() {
            "target_role" => fields.target_role = Some(value),
            "experience_level" => fields.experience_level = Some(value),
            "company_type" => fields.company_type = Some(value),
            _ => {}
        }
    }

    Ok(fields)
}

impl UploadFields {
    pub fn validate(self) -> Result<UploadForm, AppError> {
        let data = self
            .data
            .ok_or_else(|| AppError::Validation("No resume file provided".to_string()))?;
        let filename = self
            .filename
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AppError::Validation("Uploaded file has no filename".to_string()))?;

        let kind = UploadKind::from_filename(&filename).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported file type for '{filename}'. Allowed: .pdf, .jpg, .jpeg, .png"
            ))
        })?;
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(
                "Uploaded file exceeds the 10 MB limit".to_string(),
            ));
        }
        let extension = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let survey = SurveyContext {
            target_role: parse_choice::<TargetRole>("target_role", self.target_role)?,
            experience_level: parse_choice::<ExperienceLevel>(
                "experience_level",
                self.experience_level,
            )?,
            company_type: parse_choice::<CompanyType>("company_type", self.company_type)?,
        };

        Ok(UploadForm {
            filename,
            extension,
            data,
            kind,
            survey,
        })
    }
}

fn parse_choice<T>(field: &str, value: Option<String>) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing survey field: {field}")))?;
    value
        .parse::<T>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(filename: &str) -> UploadFields {
        UploadFields {
            filename: Some(filename.to_string()),
            data: Some(Bytes::from_static(b"%PDF-1.7 ...")),
            target_role: Some("backend".to_string()),
            experience_level: Some("junior".to_string()),
            company_type: Some("startup".to_string()),
        }
    }

    fn validation_message(result: Result<UploadForm, AppError>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_pdf_upload() {
        let form = fields("Jane_Doe.PDF").validate().unwrap();
        assert_eq!(form.kind, UploadKind::Pdf);
        assert_eq!(form.extension, "pdf");
        assert_eq!(form.survey.target_role, TargetRole::Backend);
        assert_eq!(form.survey.experience_level, ExperienceLevel::Junior);
        assert_eq!(form.survey.company_type, CompanyType::Startup);
    }

    #[test]
    fn test_valid_image_upload() {
        let form = fields("scan.jpeg").validate().unwrap();
        assert_eq!(form.kind, UploadKind::Image);
        assert_eq!(form.extension, "jpeg");
    }

    #[test]
    fn test_docx_is_rejected() {
        let msg = validation_message(fields("resume.docx").validate());
        assert!(msg.contains("Unsupported file type"));
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let mut f = fields("resume.pdf");
        f.data = None;
        assert_eq!(validation_message(f.validate()), "No resume file provided");
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let mut f = fields("resume.pdf");
        f.data = Some(Bytes::new());
        assert_eq!(validation_message(f.validate()), "Uploaded file is empty");
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let mut f = fields("resume.pdf");
        f.data = Some(Bytes::from(vec![b'x'; MAX_UPLOAD_BYTES + 1]));
        assert!(validation_message(f.validate()).contains("10 MB"));
    }

    #[test]
    fn test_missing_survey_field_is_rejected() {
        let mut f = fields("resume.pdf");
        f.company_type = None;
        assert_eq!(
            validation_message(f.validate()),
            "Missing survey field: company_type"
        );

        let mut f = fields("resume.pdf");
        f.target_role = Some("   ".to_string());
        assert_eq!(
            validation_message(f.validate()),
            "Missing survey field: target_role"
        );
    }

    #[test]
    fn test_unknown_survey_value_is_rejected() {
        let mut f = fields("resume.pdf");
        f.experience_level = Some("principal".to_string());
        assert_eq!(
            validation_message(f.validate()),
            "'principal' is not a valid experience_level"
        );
    }
}
