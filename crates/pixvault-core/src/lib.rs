//! Pixvault Core Library
//!
//! This crate provides the domain models, error types, configuration and constants
//! that are shared across all Pixvault components.

pub mod config;
pub mod constants;
pub mod error;
pub mod media_backend;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, MediaServerConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use media_backend::MediaBackend;
pub use models::{ResizeRequest, StorageCategory, UploadResponse};
