//! Shared constants
//!
//! Defaults used by configuration loading and the codec allow-list shared by the
//! validation gate.

/// Codecs accepted as images when `ALLOWED_CODECS` is not set.
pub const DEFAULT_ALLOWED_CODECS: &[&str] = &["jpeg", "mjpeg", "png", "gif"];

/// Marker used in cache key material for a dimension that was not requested.
pub const ABSENT_DIMENSION_MARKER: &str = "undefined";

/// Public URL prefix under which stored originals are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// One year: variants are content-and-size deterministic and never reused.
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 31_536_000;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_UPLOAD_ROOT: &str = "uploads";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const STAGING_DIR_NAME: &str = ".staging";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TRANSCODE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
/// Uploads are buffered in memory; anything above this is a misconfiguration.
pub const MAX_FILE_SIZE_MB_LIMIT: u64 = 4096;
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;
pub const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 256;
