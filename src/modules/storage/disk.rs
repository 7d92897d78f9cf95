use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Local filesystem blob store.
///
/// Blobs live under a single root directory and are addressed by the
/// relative path returned from [`DiskStorage::write`]. Names are generated,
/// never caller-controlled, so two uploads of the same file can coexist.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet
    pub async fn ensure_root_exists(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a blob under `folder` with a generated unique name.
    ///
    /// Returns the relative path the blob was stored under.
    pub async fn write(&self, folder: &str, original_name: &str, data: &[u8]) -> io::Result<String> {
        let name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name));
        let relative = match folder.trim_matches('/') {
            "" => name,
            folder => format!("{}/{}", folder, name),
        };

        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&absolute, data).await?;

        debug!("Blob written: {}", relative);
        Ok(relative)
    }

    /// Remove a blob by its relative path.
    ///
    /// Returns `Ok(false)` when the blob was already absent.
    pub async fn remove(&self, relative: &str) -> io::Result<bool> {
        match fs::remove_file(self.root.join(relative)).await {
            Ok(()) => {
                debug!("Blob removed: {}", relative);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether a blob exists at the given relative path
    pub async fn exists(&self, relative: &str) -> bool {
        fs::try_exists(self.root.join(relative)).await.unwrap_or(false)
    }
}

/// Keep alphanumerics, dots, hyphens and underscores; replace the rest.
/// The stored name only matters for operators browsing the disk, the
/// original name lives in the catalog.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}
