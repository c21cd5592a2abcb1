//! Shared name and key generation.
//!
//! Upload names are random (`<32 hex chars>.<ext>`) and never derived from client
//! content. Cache names are derived: `sha256("<category>/<name>_<w>_<h>")` in hex,
//! followed by the original's extension, with `undefined` standing in for a
//! dimension that was not requested.

use std::path::Path;

use pixvault_core::constants::ABSENT_DIMENSION_MARKER;
use pixvault_core::{ResizeRequest, StorageCategory};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Extension of `name` (without the dot), if it has a non-empty one.
pub fn file_extension(name: &str) -> Option<&str> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Generate the on-disk name for a new upload.
///
/// The stem is 128 random bits; the extension of the client-supplied name is kept
/// (lowercased) so content types can be inferred when the file is served.
pub fn generate_upload_file_name(original_name: Option<&str>) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    let extension = original_name
        .and_then(file_extension)
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", stem, ext.to_ascii_lowercase()),
        None => stem,
    }
}

/// Deterministic cache key for a (original, width, height) triple.
pub fn derive_cache_key(
    category: StorageCategory,
    file_name: &str,
    resize: &ResizeRequest,
) -> String {
    let dimension = |value: Option<u32>| {
        value
            .map(|v| v.to_string())
            .unwrap_or_else(|| ABSENT_DIMENSION_MARKER.to_string())
    };

    let material = format!(
        "{}/{}_{}_{}",
        category.as_str(),
        file_name,
        dimension(resize.width),
        dimension(resize.height)
    );

    hex::encode(Sha256::digest(material.as_bytes()))
}

/// Cache file name: the cache key plus the original's extension.
pub fn cache_file_name(category: StorageCategory, file_name: &str, resize: &ResizeRequest) -> String {
    let key = derive_cache_key(category, file_name, resize);
    match file_extension(file_name) {
        Some(ext) => format!("{}.{}", key, ext),
        None => key,
    }
}
