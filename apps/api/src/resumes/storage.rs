use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::UploadKind;

/// `resumes/<user_id>/<resume_id>.<ext>`, keeping the original (lowercased) extension.
pub fn object_key(user_id: Uuid, resume_id: Uuid, extension: &str) -> String {
    format!(
        "resumes/{}/{}.{}",
        user_id,
        resume_id,
        extension.to_ascii_lowercase()
    )
}

pub fn content_type(kind: UploadKind, extension: &str) -> &'static str {
    match (kind, extension.to_ascii_lowercase().as_str()) {
        (UploadKind::Pdf, _) => "application/pdf",
        (UploadKind::Image, "png") => "image/png",
        (UploadKind::Image, _) => "image/jpeg",
    }
}

pub async fn put_resume_file(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    data: Bytes,
    content_type: &str,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(data))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

    info!("Uploaded resume file to s3://{bucket}/{key}");
    Ok(())
}

pub async fn fetch_resume_file(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<Bytes, AppError> {
    let object = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("download of {key} failed: {e}")))?;

    let data = object
        .body
        .collect()
        .await
        .map_err(|e| AppError::S3(format!("reading {key} failed: {e}")))?;
    Ok(data.into_bytes())
}

pub async fn delete_resume_file(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<(), AppError> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("delete of {key} failed: {e}")))?;

    info!("Deleted s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        let user = Uuid::nil();
        let resume = Uuid::from_u128(1);
        assert_eq!(
            object_key(user, resume, "PDF"),
            format!("resumes/{user}/{resume}.pdf")
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(UploadKind::Pdf, "pdf"), "application/pdf");
        assert_eq!(content_type(UploadKind::Image, "PNG"), "image/png");
        assert_eq!(content_type(UploadKind::Image, "jpeg"), "image/jpeg");
        assert_eq!(content_type(UploadKind::Image, "jpg"), "image/jpeg");
    }
}
