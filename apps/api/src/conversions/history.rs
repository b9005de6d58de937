use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::models::conversion::ConversionRecord;
use crate::storage;

/// One history entry as shown to the user.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
    /// `None` when the storage key could not be resolved to a URL; the
    /// rest of the listing is unaffected.
    pub download_url: Option<String>,
}

/// Lists a user's past conversions, newest first. Re-invocable; no cursor
/// state is kept between calls.
pub async fn list_history(
    db: &PgPool,
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    download_ttl: std::time::Duration,
    user_id: &str,
) -> Result<Vec<HistoryEntry>, AppError> {
    let records: Vec<ConversionRecord> =
        sqlx::query_as("SELECT * FROM conversions WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(db)
            .await?;

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let download_url =
            match storage::download_url(s3, bucket, &record.pdf_storage_key, download_ttl).await {
                Ok(url) => Some(url),
                Err(e) => {
                    // One unresolvable key must not take down the listing.
                    warn!(
                        "Failed to resolve download URL for {}: {e}",
                        record.pdf_storage_key
                    );
                    None
                }
            };
        entries.push(HistoryEntry {
            original_filename: record.original_filename,
            created_at: record.created_at,
            download_url,
        });
    }
    Ok(entries)
}
