//! Audio file metadata model.

use serde::{Deserialize, Serialize};

/// Metadata record for an uploaded audio file. Binary content lives on disk
/// at `file_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFile {
    pub id: String,
    /// User-facing name, independent of the on-disk name
    pub filename: String,
    pub file_path: String,
    pub owner_id: String,
    pub created_at: String,
}

/// Query parameters for POST /audio/upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadParams {
    /// Optional display name; defaults to the uploaded file's name
    pub filename: Option<String>,
}
