//! The conversion workflow: persist the upload into a scoped temp
//! directory, convert it, upload the PDF, insert the record.

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::convert;
use crate::errors::AppError;
use crate::models::conversion::ConversionRecord;
use crate::storage;

/// Outcome of a successful conversion.
#[derive(Debug)]
pub struct StoredConversion {
    pub record: ConversionRecord,
    pub download_url: String,
}

/// Storage keys are namespaced by user and salted with a fresh UUID per
/// conversion. Uniqueness is probabilistic (UUID collision space), not
/// enforced by a constraint.
pub fn storage_key_for(user_id: &str) -> String {
    format!("{user_id}/{}.pdf", Uuid::new_v4())
}

/// Runs one conversion end to end.
///
/// Steps are hard-sequential: each depends on the previous one succeeding.
/// The record is inserted only after the PDF is in the object store; if the
/// insert then fails, the blob stays behind as an accepted orphan (no
/// compensating delete). Temp files live in a `TempDir` whose `Drop`
/// releases them on every exit path, success or failure.
pub async fn convert_and_store(
    db: &PgPool,
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    download_ttl: std::time::Duration,
    user_id: &str,
    original_filename: &str,
    upload: &[u8],
) -> Result<StoredConversion, AppError> {
    let workdir = tempfile::tempdir()?;
    let image_path = workdir.path().join("upload");
    let pdf_path = workdir.path().join("converted.pdf");

    tokio::fs::write(&image_path, upload).await?;

    // CPU-bound encode; keep it off the async runtime.
    let (src, dst) = (image_path.clone(), pdf_path.clone());
    tokio::task::spawn_blocking(move || convert::image_to_pdf(&src, &dst))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("conversion task failed: {e}")))??;

    let storage_key = storage_key_for(user_id);
    let pdf_bytes = tokio::fs::read(&pdf_path).await?;
    storage::upload_pdf(s3, bucket, &storage_key, pdf_bytes).await?;

    let record = insert_record(db, user_id, original_filename, &storage_key).await?;
    info!(
        "Recorded conversion {} for user {user_id} ({original_filename} -> {storage_key})",
        record.id
    );

    let download_url = storage::download_url(s3, bucket, &storage_key, download_ttl).await?;

    Ok(StoredConversion {
        record,
        download_url,
    })
}

async fn insert_record(
    db: &PgPool,
    user_id: &str,
    original_filename: &str,
    pdf_storage_key: &str,
) -> Result<ConversionRecord, AppError> {
    Ok(sqlx::query_as::<_, ConversionRecord>(
        r#"
        INSERT INTO conversions (user_id, original_filename, pdf_storage_key, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(original_filename)
    .bind(pdf_storage_key)
    .bind(Utc::now())
    .fetch_one(db)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_is_user_namespaced() {
        let key = storage_key_for("u1");
        assert!(key.starts_with("u1/"));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn test_storage_key_embeds_a_uuid() {
        let key = storage_key_for("u1");
        let middle = key
            .strip_prefix("u1/")
            .and_then(|rest| rest.strip_suffix(".pdf"))
            .unwrap();
        Uuid::parse_str(middle).expect("key segment should be a UUID");
    }

    #[test]
    fn test_storage_key_is_fresh_per_call() {
        assert_ne!(storage_key_for("u1"), storage_key_for("u1"));
    }
}
