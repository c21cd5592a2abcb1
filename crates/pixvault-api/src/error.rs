//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Storage and
//! processing errors convert into `HttpAppError` through `AppError`, so every
//! failure renders with the same status mapping, body shape and logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pixvault_core::{AppError, ErrorMetadata, LogLevel};
use pixvault_processing::ProcessingError;
use pixvault_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `IntoResponse` can be implemented for the core `AppError`.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl HttpAppError {
    fn to_body(&self, hide_details: bool) -> ErrorResponse {
        let app_error = &self.0;
        let (details, error_type) = if hide_details || app_error.is_sensitive() {
            (None, None)
        } else {
            (
                Some(app_error.detailed_message()),
                Some(app_error.error_type().to_string()),
            )
        };

        ErrorResponse {
            error: app_error.client_message(),
            details,
            error_type,
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&self.0);

        (status, Json(self.to_body(is_production_env()))).into_response()
    }
}

// Convert domain errors to HttpAppError

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidName(name) => {
                AppError::InvalidInput(format!("Invalid file name: {}", name))
            }
            StorageError::WriteFailed(msg) | StorageError::DeleteFailed(msg) => {
                AppError::Storage(msg)
            }
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<ProcessingError> for HttpAppError {
    fn from(err: ProcessingError) -> Self {
        let app = match err {
            ProcessingError::ProbeFailure(reason) => {
                tracing::debug!(reason = %reason, "Upload could not be probed");
                AppError::InvalidMedia("Invalid file format".to_string())
            }
            ProcessingError::UnsupportedCodec(codec) => {
                AppError::InvalidMedia(format!("Invalid media format: {}", codec))
            }
            ProcessingError::TranscodeFailure(msg) => AppError::TranscodeFailed(msg),
            ProcessingError::NotFound(_) => AppError::NotFound("Image not found".to_string()),
            ProcessingError::InvalidDimensions(msg) => AppError::InvalidInput(msg),
            ProcessingError::Io(err) => AppError::Internal(format!("IO error: {}", err)),
            ProcessingError::Storage(err) => return HttpAppError::from(err),
        };
        HttpAppError(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_codec_names_the_codec() {
        let err = HttpAppError::from(ProcessingError::UnsupportedCodec("h264".to_string()));
        assert_eq!(err.0.http_status_code(), 400);

        let body = err.to_body(true);
        assert_eq!(body.error, "Invalid media format: h264");
        assert_eq!(body.code, "INVALID_MEDIA");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_probe_failure_is_invalid_file_format() {
        let err = HttpAppError::from(ProcessingError::ProbeFailure("exit 1".to_string()));
        assert_eq!(err.0.http_status_code(), 400);
        assert_eq!(err.to_body(false).error, "Invalid file format");
    }

    #[test]
    fn test_transcode_failure_is_server_error_without_details() {
        let err = HttpAppError::from(ProcessingError::TranscodeFailure(
            "ffmpeg exited with 1: /srv/cache/x.png".to_string(),
        ));
        assert_eq!(err.0.http_status_code(), 500);

        let body = err.to_body(false);
        assert_eq!(body.code, "TRANSCODE_FAILED");
        assert!(body.recoverable);
        assert!(body.details.is_none());
        assert!(!body.error.contains("/srv/cache"));
    }

    #[test]
    fn test_not_found_and_dimensions() {
        let not_found = HttpAppError::from(ProcessingError::NotFound("postImage/x.png".to_string()));
        assert_eq!(not_found.0.http_status_code(), 404);

        let dims = HttpAppError::from(ProcessingError::InvalidDimensions(
            "width must be a positive integer".to_string(),
        ));
        assert_eq!(dims.0.http_status_code(), 400);
        assert_eq!(dims.to_body(false).error, "width must be a positive integer");
    }

    #[test]
    fn test_storage_error_through_processing() {
        let err = HttpAppError::from(ProcessingError::Storage(StorageError::WriteFailed(
            "disk full".to_string(),
        )));
        assert_eq!(err.0.error_code(), "STORAGE_ERROR");
    }
}
