use std::path::Path;

use axum::extract::Multipart;
use chrono::Utc;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::{analyzer::UploadedImage, error::AppError};

pub const IMAGES_FIELD: &str = "images";

/// Files saved for one request. The scratch directory and everything in it
/// is removed when the scope is closed or dropped.
pub struct UploadScope {
    dir: TempDir,
    pub images: Vec<UploadedImage>,
}

impl UploadScope {
    /// Creates a fresh `skin-upload-*` directory under `parent`.
    pub fn new_in(parent: &Path) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("skin-upload-").tempdir_in(parent)?;
        Ok(Self { dir, images: Vec::new() })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    async fn save(&mut self, original_name: &str, data: &[u8]) -> std::io::Result<()> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let filename = format!("{}-{}{}", Utc::now().timestamp_millis(), self.images.len(), extension);
        let path = self.dir.path().join(&filename);
        tokio::fs::write(&path, data).await?;
        self.images.push(UploadedImage { filename, path });
        Ok(())
    }

    /// Removes the directory off the async runtime.
    pub async fn close(self) {
        let dir = self.dir;
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to remove upload directory: {}", e),
            Err(e) => warn!("Upload cleanup task failed: {}", e),
        }
    }
}

/// Saves every file sent under `images`, at most `limit` of them, into a new
/// scope under `parent`. Other fields are skipped.
pub async fn collect_images(multipart: &mut Multipart, parent: &Path, limit: usize) -> Result<UploadScope, AppError> {
    let mut scope = UploadScope::new_in(parent)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if scope.images.len() >= limit {
            return Err(AppError::BadRequest(format!("Too many images, at most {limit} allowed")));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;
        scope.save(&original_name, &data).await?;
    }

    info!(files = scope.images.len(), dir = %scope.path().display(), "Saved uploaded images");
    Ok(scope)
}
