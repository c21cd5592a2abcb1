//! Common utilities for upload and serving handlers

use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use pixvault_core::AppError;

/// The single `file` field of an upload form.
#[derive(Debug)]
pub struct UploadedFile {
    pub data: Bytes,
    /// Name supplied by the client; only its extension is ever used.
    pub file_name: Option<String>,
}

/// Extract the `file` field from a multipart form.
///
/// Returns `Ok(None)` when the form has no `file` field. Other fields are ignored.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
    max_size: usize,
) -> Result<Option<UploadedFile>, AppError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        if upload.is_some() {
            return Err(AppError::BadRequest(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;
        validate_file_size(data.len(), max_size)?;

        upload = Some(UploadedFile { data, file_name });
    }

    Ok(upload)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File exceeds the maximum upload size".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Content type to serve a stored file with, inferred from its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = pixvault_storage::file_extension(file_name)
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" | "jpe" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Parse an optional dimension query value. Empty means absent.
pub fn parse_dimension(name: &str, value: Option<&str>) -> Result<Option<u32>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<u32>().map(Some).map_err(|_| {
            AppError::InvalidInput(format!("{} must be a positive integer", name))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("width", None).unwrap(), None);
        assert_eq!(parse_dimension("width", Some("")).unwrap(), None);
        assert_eq!(parse_dimension("width", Some("100")).unwrap(), Some(100));
        assert_eq!(parse_dimension("width", Some("0")).unwrap(), Some(0));
        assert!(parse_dimension("width", Some("-5")).is_err());
        assert!(parse_dimension("width", Some("abc")).is_err());
        assert!(parse_dimension("height", Some("1.5")).is_err());
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(10, 10).is_ok());
        assert!(matches!(
            validate_file_size(11, 10),
            Err(AppError::PayloadTooLarge(_))
        ));
    }
}
