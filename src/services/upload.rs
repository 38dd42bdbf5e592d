//! Upload services - Caricamento di immagini e allegati

use crate::core::{ApiResponse, AppError, AppState};
use crate::dtos::UploadDTO;
use crate::entities::User;
use crate::integrations::extension_for;
use axum::{
    Extension,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const FILE_FIELD: &str = "file";

#[instrument(skip(state, current_user, multipart), fields(user_id = %current_user.user_id))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UploadDTO>, AppError> {
    // 1. Cercare il campo "file" nel multipart
    // 2. Content type ammesso (png, jpeg, gif, webp, pdf), altrimenti 400
    // 3. Dimensione entro MAX_UPLOAD_BYTES, altrimenti 413
    // 4. Salvare con nome casuale (UUID) mantenendo l'estensione

    let mut multipart = multipart?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), "Invalid multipart body").with_details(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = extension_for(&content_type).ok_or_else(|| {
            warn!("Rejected upload with content type '{}'", content_type);
            AppError::bad_request("Unsupported file type")
        })?;

        let data = field.bytes().await.map_err(|e| {
            AppError::new(e.status(), "Invalid multipart body").with_details(e.body_text())
        })?;
        if data.len() > state.config.max_upload_bytes {
            return Err(AppError::payload_too_large("File is too large"));
        }
        if data.is_empty() {
            return Err(AppError::bad_request("File is empty"));
        }

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let url = state.storage.store(&file_name, &data).await.map_err(|e| {
            error!("Failed to store upload: {:?}", e);
            AppError::internal_server_error("Failed to store file")
        })?;

        info!("Upload stored as {}", file_name);
        return Ok(ApiResponse::created(
            "File uploaded",
            UploadDTO {
                url,
                file_name,
                size: data.len() as u64,
                content_type,
            },
        ));
    }

    Err(AppError::bad_request("Missing 'file' field"))
}
