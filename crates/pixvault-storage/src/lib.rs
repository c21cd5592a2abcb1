//! Pixvault Storage Library
//!
//! The local filesystem is the only persistent store. This crate owns its layout:
//!
//! - one directory per [`StorageCategory`] holding validated originals,
//! - a staging directory where candidate uploads wait for the validation gate,
//! - one flat cache directory holding resized variants named `<hash>.<ext>`.
//!
//! File names handed to this crate must be plain names: no separators, no `..`,
//! no leading dot. Name and cache key generation live in the `keys` module so
//! every caller derives them the same way.

pub mod error;
pub mod keys;
pub mod local;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use keys::{cache_file_name, derive_cache_key, file_extension, generate_upload_file_name};
pub use local::AssetStore;
pub use pixvault_core::StorageCategory;
