//! Design file storage for custom order intake.

use crate::models::NewDesignFile;
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Stores uploaded design files under a configured directory. Database
/// records for the files are written by the caller; when that write fails,
/// `remove` rolls the stored files back off disk.
#[derive(Clone)]
pub struct DesignFileStore {
    root: PathBuf,
}

impl DesignFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist one uploaded file to disk under a collision-free name.
    /// The original file name is kept only as metadata.
    #[instrument(skip(self, data), fields(file_name = %file_name, bytes = data.len()))]
    pub async fn store(
        &self,
        file_name: &str,
        content_type: Option<String>,
        data: &[u8],
    ) -> Result<NewDesignFile, AppError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to create uploads dir: {}", e))
        })?;

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        let stored_path = self.root.join(&stored_name);

        tokio::fs::write(&stored_path, data).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to store design file: {}", e))
        })?;

        info!(stored = %stored_path.display(), "Design file stored");

        Ok(NewDesignFile {
            file_name: file_name.to_string(),
            stored_path: stored_path.to_string_lossy().into_owned(),
            content_type,
        })
    }

    /// Remove previously stored files. Used to roll back disk state when
    /// the enclosing order creation fails. Removal failures are logged,
    /// not propagated: the original error matters more.
    #[instrument(skip(self, files))]
    pub async fn remove(&self, files: &[NewDesignFile]) {
        for file in files {
            if let Err(e) = tokio::fs::remove_file(&file.stored_path).await {
                warn!(path = %file.stored_path, error = %e, "Failed to remove stored file");
            }
        }
    }
}
