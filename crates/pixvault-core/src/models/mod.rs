//! Domain models

pub mod category;
pub mod media;

pub use category::StorageCategory;
pub use media::{ResizeRequest, UploadResponse};
