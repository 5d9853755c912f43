//! On-disk storage for uploaded audio content.
//!
//! Content is stored flat under the configured root, named by the metadata
//! record id plus the original extension. The user-supplied name never
//! reaches the filesystem.

use std::path::{Path, PathBuf};

use crate::errors::AppError;

/// File extensions accepted for upload.
const ALLOWED_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".ogg"];

/// Audio content store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct AudioStorage {
    root: PathBuf,
}

impl AudioStorage {
    /// Open the store, creating the root directory if needed.
    pub async fn open(root: &Path) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Write uploaded content, returning the path it was stored at.
    pub async fn save(&self, id: &str, extension: &str, content: &[u8]) -> Result<PathBuf, AppError> {
        let path = self.root.join(format!("{}{}", id, extension));
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    /// Remove stored content. Missing files are ignored.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Validate an uploaded file's name, returning its lowercased extension.
pub fn validate_extension(filename: &str) -> Result<String, AppError> {
    let lower = filename.to_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| ext.to_string())
        .ok_or_else(|| {
            AppError::Validation("Only .mp3, .wav, and .ogg files are allowed".to_string())
        })
}

/// Strip the extension off an uploaded file's name for use as display name.
pub fn display_name(filename: &str) -> String {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename[..idx].to_string(),
        _ => filename.to_string(),
    }
}
