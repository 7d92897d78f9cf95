use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::error::AppError;
use crate::features::files::dtos::NewUpload;
use crate::features::files::models::File;
use crate::modules::storage::DiskStorage;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("failed to write blob: {0}")]
    Storage(#[source] std::io::Error),

    #[error("failed to record file metadata: {0}")]
    Catalog(#[source] sqlx::Error),

    #[error("file lookup failed: {0}")]
    Lookup(#[source] sqlx::Error),
}

impl From<FileStoreError> for AppError {
    fn from(err: FileStoreError) -> Self {
        AppError::FileStorage(err.to_string())
    }
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The catalog had no row for the identifier; nothing to do
    NothingToDelete,
}

/// Contract for the file store: blob persistence plus a metadata catalog.
///
/// The two writes are not covered by a shared transaction; callers that
/// combine a stored file with other writes own the compensation logic.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist the blob under a generated unique name within `folder`
    /// (or the store default), record `{path, original_name}` in the
    /// catalog and return the new identifier.
    async fn store(&self, upload: NewUpload, folder: Option<&str>)
        -> Result<i64, FileStoreError>;

    /// Fetch catalog metadata; `Ok(None)` for an unknown identifier.
    async fn find_by_id(&self, id: i64) -> Result<Option<File>, FileStoreError>;

    /// Remove the blob (tolerating one already absent) and the catalog row.
    /// An unknown identifier is reported as `NothingToDelete`, not an error.
    async fn delete(&self, id: i64) -> Result<DeleteOutcome, FileStoreError>;
}

/// Metadata catalog backing a [`DiskFileStore`]
#[async_trait]
pub trait FileCatalog: Send + Sync {
    async fn insert(&self, path: &str, original_name: &str) -> Result<i64, sqlx::Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<File>, sqlx::Error>;

    async fn delete(&self, id: i64) -> Result<(), sqlx::Error>;
}

/// Postgres-backed file catalog
pub struct PgFileCatalog {
    pool: PgPool,
}

impl PgFileCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileCatalog for PgFileCatalog {
    async fn insert(&self, path: &str, original_name: &str) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO files (path, original_name)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(path)
        .bind(original_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<File>, sqlx::Error> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT id, path, original_name, created_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// File store backed by local disk blobs and a database catalog
pub struct DiskFileStore {
    catalog: Arc<dyn FileCatalog>,
    disk: Arc<DiskStorage>,
    default_folder: String,
}

impl DiskFileStore {
    pub fn new(pool: PgPool, disk: Arc<DiskStorage>, default_folder: String) -> Self {
        Self::with_catalog(Arc::new(PgFileCatalog::new(pool)), disk, default_folder)
    }

    fn with_catalog(
        catalog: Arc<dyn FileCatalog>,
        disk: Arc<DiskStorage>,
        default_folder: String,
    ) -> Self {
        Self {
            catalog,
            disk,
            default_folder,
        }
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn store(&self, upload: NewUpload, folder: Option<&str>) -> Result<i64, FileStoreError> {
        let folder = folder.unwrap_or(&self.default_folder);

        let path = self
            .disk
            .write(folder, &upload.original_name, &upload.data)
            .await
            .map_err(FileStoreError::Storage)?;

        match self.catalog.insert(&path, &upload.original_name).await {
            Ok(id) => {
                info!(
                    "File stored: id={}, path={}, original_name={}",
                    id, path, upload.original_name
                );
                Ok(id)
            }
            Err(e) => {
                // The blob and the catalog share no transaction; remove the
                // just-written blob so a catalog failure leaves no orphan.
                if let Err(cleanup_err) = self.disk.remove(&path).await {
                    warn!(
                        "Failed to remove blob '{}' after catalog failure: {}",
                        path, cleanup_err
                    );
                }
                Err(FileStoreError::Catalog(e))
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<File>, FileStoreError> {
        self.catalog
            .find_by_id(id)
            .await
            .map_err(FileStoreError::Lookup)
    }

    async fn delete(&self, id: i64) -> Result<DeleteOutcome, FileStoreError> {
        let file = match self.find_by_id(id).await? {
            Some(file) => file,
            None => {
                debug!("File {} not in catalog, nothing to delete", id);
                return Ok(DeleteOutcome::NothingToDelete);
            }
        };

        // A missing blob is logged, not fatal; the catalog row still goes.
        match self.disk.remove(&file.path).await {
            Ok(true) => debug!("Blob deleted: {}", file.path),
            Ok(false) => warn!("Blob already absent: {}", file.path),
            Err(e) => warn!("Failed to remove blob '{}': {}", file.path, e),
        }

        self.catalog
            .delete(id)
            .await
            .map_err(FileStoreError::Catalog)?;

        info!("File deleted: id={}, path={}", id, file.path);
        Ok(DeleteOutcome::Deleted)
    }
}
