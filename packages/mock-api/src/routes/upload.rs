use std::path::Path;

use axum::{
    extract::{Extension, Multipart},
    Json,
};
use serde::Serialize;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::store::{Attachment, AttachmentKind};

/// Descriptor of a stored upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub thumbnail_url: Option<String>,
}

/// POST /upload
///
/// Reads the multipart `file` field, writes it to the upload directory as
/// `{uuid}-{filename}` and registers it so later messages can reference it.
pub async fn upload_handler(
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = sanitize_filename(field.file_name().unwrap_or("file"));
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), filename);
        tokio::fs::create_dir_all(&state.config.upload_dir).await?;
        tokio::fs::write(state.config.upload_dir.join(&stored_name), &data).await?;

        let url = public_file_url(&state.config.public_url, &stored_name)?;
        let is_image = mime_type.starts_with("image/");
        let response = UploadResponse {
            id: Uuid::new_v4().to_string(),
            thumbnail_url: is_image.then(|| url.clone()),
            url,
            filename,
            mime_type,
            size: data.len() as u64,
        };

        let kind = if is_image {
            AttachmentKind::Image
        } else {
            AttachmentKind::File
        };
        state.store.write().await.register_attachment(Attachment {
            id: response.id.clone(),
            filename: Some(response.filename.clone()),
            mime_type: Some(response.mime_type.clone()),
            size: Some(response.size),
            thumbnail_url: response.thumbnail_url.clone(),
            ..Attachment::new(kind, response.url.clone())
        });

        info!(
            upload_id = %response.id,
            file = %response.filename,
            size = response.size,
            "Stored upload"
        );
        return Ok(Json(response));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// Keep only the final path component of a client-supplied name.
fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "file".to_string())
}

fn public_file_url(public_url: &str, stored_name: &str) -> Result<String, ApiError> {
    let mut url = Url::parse(public_url)
        .map_err(|e| ApiError::Internal(format!("PUBLIC_URL is not a valid URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Internal("PUBLIC_URL cannot be a base URL".to_string()))?
        .pop_if_empty()
        .push("uploads")
        .push(stored_name);
    Ok(url.into())
}
