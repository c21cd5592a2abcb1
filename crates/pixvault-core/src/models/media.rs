use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Response returned after an upload has passed the validation gate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    /// Generated on-disk name, `<32 hex chars>.<ext>`
    pub file_name: String,
    /// Relative URL the original can be fetched from
    pub file_url: String,
}

/// Requested output size for a variant read.
///
/// Either dimension may be omitted; the omitted side follows the source aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResizeRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ResizeRequest {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    /// No dimension requested: the original is served as-is.
    pub fn is_original(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Reject zero-sized or oversized dimensions.
    pub fn validate(&self, max_dimension: u32) -> Result<(), AppError> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            match value {
                Some(0) => {
                    return Err(AppError::InvalidInput(format!(
                        "{} must be a positive integer",
                        name
                    )))
                }
                Some(v) if v > max_dimension => {
                    return Err(AppError::InvalidInput(format!(
                        "{} must not exceed {} pixels",
                        name, max_dimension
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }
}
