//! Processing errors

use pixvault_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The file could not be inspected: unreadable, not media, or the prober itself failed.
    #[error("Probe failed: {0}")]
    ProbeFailure(String),

    /// Probed successfully, but the codec is not in the allow-list.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailure(String),

    #[error("Original not found: {0}")]
    NotFound(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProcessingError {
    /// Rebuild an error that was shared between single-flight waiters.
    pub(crate) fn from_shared(err: &ProcessingError) -> Self {
        match err {
            Self::ProbeFailure(m) => Self::ProbeFailure(m.clone()),
            Self::UnsupportedCodec(m) => Self::UnsupportedCodec(m.clone()),
            Self::TranscodeFailure(m) => Self::TranscodeFailure(m.clone()),
            Self::NotFound(m) => Self::NotFound(m.clone()),
            Self::InvalidDimensions(m) => Self::InvalidDimensions(m.clone()),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::Storage(e) => Self::TranscodeFailure(e.to_string()),
        }
    }
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;
