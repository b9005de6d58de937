use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One completed conversion. Created after the PDF is in the object store;
/// immutable from then on, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversionRecord {
    pub id: Uuid,
    /// Opaque identifier from the identity provider; not validated locally.
    pub user_id: String,
    /// Uploader-supplied name, stored verbatim.
    pub original_filename: String,
    /// `{user_id}/{uuid}.pdf` in the object store.
    pub pdf_storage_key: String,
    pub created_at: DateTime<Utc>,
}
