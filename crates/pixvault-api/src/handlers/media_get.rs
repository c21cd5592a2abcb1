use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use pixvault_core::{AppError, ResizeRequest, StorageCategory};
use tokio_util::io::ReaderStream;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{content_type_for, parse_dimension};

/// Serve an original image or a resized variant of it.
///
/// Without `width`/`height` the stored original is returned byte for byte.
/// With either, the variant is produced on first request and cached on disk;
/// the omitted side follows the original's aspect ratio.
#[utoipa::path(
    get,
    path = "/uploads/{category}/{filename}",
    tag = "uploads",
    params(
        ("category" = String, Path, description = "Storage category: `profileImage` or `postImage`"),
        ("filename" = String, Path, description = "File name returned by the upload endpoint"),
        ("width" = Option<u32>, Query, description = "Target width in pixels"),
        ("height" = Option<u32>, Query, description = "Target height in pixels")
    ),
    responses(
        (status = 200, description = "Image bytes, Content-Type inferred from the file extension"),
        (status = 400, description = "Invalid width or height", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse),
        (status = 500, description = "Resizing failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "get_image"))]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((category, filename)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, HttpAppError> {
    let category: StorageCategory = category
        .parse()
        .map_err(|_| AppError::NotFound("Image not found".to_string()))?;

    // Parsed by hand so a bad value yields our 400 body instead of axum's rejection.
    let resize = ResizeRequest::new(
        parse_dimension("width", query.get("width").map(String::as_str))?,
        parse_dimension("height", query.get("height").map(String::as_str))?,
    );

    let resolved = state.resolver.resolve(category, &filename, resize).await?;

    let file = tokio::fs::File::open(&resolved.path).await.map_err(|e| {
        tracing::error!(error = %e, path = %resolved.path.display(), "Failed to open resolved file");
        AppError::from(e)
    })?;
    let content_length = file.metadata().await.map(|m| m.len()).ok();

    tracing::debug!(source = ?resolved.source, path = %resolved.path.display(), "Serving image");

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&filename))
        .header(
            header::CACHE_CONTROL,
            format!(
                "public, max-age={}, immutable",
                state.config.cache_max_age_secs()
            ),
        );
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    let response = builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
