use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use pixvault_core::{AppError, StorageCategory, UploadResponse};
use pixvault_storage::generate_upload_file_name;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;

/// Upload an image into a storage category.
///
/// The file is staged, probed by the validation gate and only then moved into
/// the category directory. A rejected file is deleted before the 400 is sent.
#[utoipa::path(
    post,
    path = "/upload/{category}",
    tag = "uploads",
    params(
        ("category" = String, Path, description = "Storage category: `profileImage` or `postImage`")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image accepted and stored", body = UploadResponse),
        (status = 400, description = "No file, or not an allowed image format", body = ErrorResponse),
        (status = 404, description = "Unknown category", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let category: StorageCategory = category
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown upload category: {}", category)))?;

    let upload = extract_multipart_file(multipart, state.config.max_file_size_bytes())
        .await?
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let file_name = generate_upload_file_name(upload.file_name.as_deref());
    let candidate = state.store.write_candidate(&file_name, &upload.data).await?;

    let verdict = state.gate.validate(&candidate).await?;

    if let Err(e) = state.store.promote(&candidate, category, &file_name).await {
        if let Err(discard_err) = state.store.discard(&candidate).await {
            tracing::error!(error = %discard_err, "Failed to delete staged upload");
        }
        return Err(e.into());
    }

    tracing::info!(
        category = %category,
        file_name = %file_name,
        codec = %verdict.codec,
        size_bytes = upload.data.len(),
        "Image uploaded"
    );

    Ok(Json(UploadResponse {
        message: format!("{} uploaded successfully", category.label()),
        file_url: category.file_url(&file_name),
        file_name,
    }))
}
