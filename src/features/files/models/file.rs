use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Catalog row for a stored blob
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: i64,
    /// Path of the blob relative to the storage root, unique per blob
    pub path: String,
    /// Original filename as uploaded, kept for display only
    pub original_name: String,
    pub created_at: DateTime<Utc>,
}
