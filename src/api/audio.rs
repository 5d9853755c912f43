//! Audio file API endpoints.

use axum::{
    extract::{Multipart, Query, State},
    Extension, Json,
};

use super::ApiResult;
use crate::errors::AppError;
use crate::models::{AudioFile, UploadParams, User};
use crate::storage;
use crate::AppState;

/// POST /audio/upload - Store an uploaded audio file.
///
/// Expects a multipart body with a `file` field. An optional `filename`
/// query parameter overrides the display name; the on-disk name is always
/// the record id.
pub async fn upload_audio(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> ApiResult<AudioFile> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .ok_or_else(|| AppError::Validation("Uploaded file has no name".to_string()))?
            .to_string();

        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        upload = Some((original_name, content.to_vec()));
        break;
    }

    let (original_name, content) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let extension = storage::validate_extension(&original_name)?;
    let filename = params
        .filename
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| storage::display_name(&original_name));

    let id = uuid::Uuid::new_v4().to_string();
    let path = state.storage.save(&id, &extension, &content).await?;

    let record = match state
        .repo
        .create_audio_file(&id, &filename, &path.to_string_lossy(), &user.id)
        .await
    {
        Ok(record) => record,
        Err(e) => {
            // Do not leave content around without a metadata row
            state.storage.remove(&path).await;
            return Err(e);
        }
    };

    tracing::info!(
        "Stored audio file {} ({} bytes) for user {}",
        record.id,
        content.len(),
        user.id
    );

    Ok(Json(record))
}

/// GET /audio/files - List the current user's audio files.
pub async fn list_audio_files(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Vec<AudioFile>> {
    let files = state.repo.list_audio_files(&user.id).await?;
    Ok(Json(files))
}
