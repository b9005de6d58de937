//! Object-store collaborator: PDF uploads and presigned download URLs.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::errors::AppError;

/// Filename the browser sees when following a download URL.
const DOWNLOAD_FILENAME: &str = "converted.pdf";

/// Writes the PDF bytes under `key`. Single attempt; a failure here means
/// nothing was recorded and the caller reports it as an upload error.
pub async fn upload_pdf(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    bytes: Vec<u8>,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::Upload(format!("put s3://{bucket}/{key}: {e}")))?;

    info!("Uploaded PDF to s3://{bucket}/{key}");
    Ok(())
}

/// Resolves `key` to a time-limited download URL. The URL serves the object
/// as an `application/pdf` attachment named `converted.pdf`.
pub async fn download_url(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    ttl: Duration,
) -> Result<String, AppError> {
    let presigning = PresigningConfig::expires_in(ttl)
        .map_err(|e| AppError::Upload(format!("presigning config: {e}")))?;

    let request = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .response_content_type("application/pdf")
        .response_content_disposition(format!("attachment; filename=\"{DOWNLOAD_FILENAME}\""))
        .presigned(presigning)
        .await
        .map_err(|e| AppError::Upload(format!("presign s3://{bucket}/{key}: {e}")))?;

    Ok(request.uri().to_string())
}
