//! Configuration module
//!
//! Configuration is read once at startup from the environment (and an optional `.env`
//! file), validated, and then passed explicitly to the components that need it.
//! Nothing below keeps global state.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_ALLOWED_CODECS, DEFAULT_CACHE_DIR, DEFAULT_CACHE_MAX_AGE_SECS,
    DEFAULT_HTTP_CONCURRENCY_LIMIT, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_FILE_SIZE_MB,
    DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_SERVER_PORT, DEFAULT_TRANSCODE_TIMEOUT_SECS,
    DEFAULT_UPLOAD_ROOT, MAX_FILE_SIZE_MB_LIMIT, STAGING_DIR_NAME,
};
use crate::media_backend::MediaBackend;
use crate::models::StorageCategory;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// `text` (default) or `json`
    pub log_format: String,
    /// Requests handled at once before new ones queue.
    pub http_concurrency_limit: usize,
}

/// Media server configuration
#[derive(Clone, Debug)]
pub struct MediaServerConfig {
    pub base: BaseConfig,
    // Directory layout
    pub upload_dirs: BTreeMap<StorageCategory, PathBuf>,
    pub staging_dir: PathBuf,
    pub cache_dir: PathBuf,
    // Probing / transcoding
    pub media_backend: MediaBackend,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub probe_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
    pub allowed_codecs: Vec<String>,
    // Request limits
    pub max_file_size_bytes: usize,
    pub max_dimension: u32,
    pub cache_max_age_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaServerConfig>);

impl Config {
    fn as_media(&self) -> &MediaServerConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaServerConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_media().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_environment(&self.as_media().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.as_media().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_media().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_media().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_media().base.http_concurrency_limit
    }

    pub fn log_format(&self) -> &str {
        &self.as_media().base.log_format
    }

    pub fn upload_dirs(&self) -> &BTreeMap<StorageCategory, PathBuf> {
        &self.as_media().upload_dirs
    }

    pub fn upload_dir(&self, category: StorageCategory) -> Option<&Path> {
        self.as_media().upload_dirs.get(&category).map(PathBuf::as_path)
    }

    pub fn staging_dir(&self) -> &Path {
        &self.as_media().staging_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.as_media().cache_dir
    }

    pub fn media_backend(&self) -> MediaBackend {
        self.as_media().media_backend
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_media().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_media().ffmpeg_path
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.as_media().probe_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.as_media().transcode_timeout_secs)
    }

    pub fn allowed_codecs(&self) -> &[String] {
        &self.as_media().allowed_codecs
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_media().max_file_size_bytes
    }

    pub fn max_dimension(&self) -> u32 {
        self.as_media().max_dimension
    }

    pub fn cache_max_age_secs(&self) -> u64 {
        self.as_media().cache_max_age_secs
    }
}

fn is_production_environment(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl MediaServerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from an arbitrary key lookup (environment, test maps).
    ///
    /// Unset or unparsable numeric values fall back to their defaults; an unknown
    /// media backend is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_format = lookup("LOG_FORMAT")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "text".to_string());

        let upload_root =
            PathBuf::from(lookup("UPLOAD_ROOT").unwrap_or_else(|| DEFAULT_UPLOAD_ROOT.to_string()));

        let mut upload_dirs = BTreeMap::new();
        for (category, override_key) in [
            (StorageCategory::Profile, "PROFILE_IMAGE_DIR"),
            (StorageCategory::Post, "POST_IMAGE_DIR"),
        ] {
            let dir = lookup(override_key)
                .map(PathBuf::from)
                .unwrap_or_else(|| upload_root.join(category.as_str()));
            upload_dirs.insert(category, dir);
        }

        let staging_dir = lookup("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| upload_root.join(STAGING_DIR_NAME));

        let cache_dir =
            PathBuf::from(lookup("CACHE_DIR").unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()));

        let media_backend = match lookup("MEDIA_BACKEND") {
            Some(value) => value.parse::<MediaBackend>()?,
            None => MediaBackend::Ffmpeg,
        };

        let allowed_codecs = lookup("ALLOWED_CODECS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_CODECS
                    .iter()
                    .map(|c| c.to_string())
                    .collect()
            });

        let max_file_size_mb: usize = parse_or(lookup("MAX_FILE_SIZE_MB"), DEFAULT_MAX_FILE_SIZE_MB);
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large: {}", max_file_size_mb))?;

        Ok(MediaServerConfig {
            base: BaseConfig {
                server_port: parse_or(lookup("SERVER_PORT"), DEFAULT_SERVER_PORT),
                cors_origins,
                environment,
                log_format,
                http_concurrency_limit: parse_or(
                    lookup("HTTP_CONCURRENCY_LIMIT"),
                    DEFAULT_HTTP_CONCURRENCY_LIMIT,
                ),
            },
            upload_dirs,
            staging_dir,
            cache_dir,
            media_backend,
            ffprobe_path: lookup("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            probe_timeout_secs: parse_or(lookup("PROBE_TIMEOUT_SECS"), DEFAULT_PROBE_TIMEOUT_SECS),
            transcode_timeout_secs: parse_or(
                lookup("TRANSCODE_TIMEOUT_SECS"),
                DEFAULT_TRANSCODE_TIMEOUT_SECS,
            ),
            allowed_codecs,
            max_file_size_bytes,
            max_dimension: parse_or(lookup("MAX_DIMENSION"), DEFAULT_MAX_DIMENSION),
            cache_max_age_secs: parse_or(lookup("CACHE_MAX_AGE_SECS"), DEFAULT_CACHE_MAX_AGE_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if is_production_environment(&self.base.environment)
            && self.base.cors_origins.iter().any(|o| o == "*")
        {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.probe_timeout_secs == 0 {
            return Err(anyhow::anyhow!("PROBE_TIMEOUT_SECS must be greater than 0"));
        }

        if self.transcode_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "TRANSCODE_TIMEOUT_SECS must be greater than 0"
            ));
        }

        if self.allowed_codecs.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CODECS must not be empty"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be greater than 0"));
        }

        if self.max_file_size_bytes as u64 > MAX_FILE_SIZE_MB_LIMIT * 1024 * 1024 {
            return Err(anyhow::anyhow!(
                "MAX_FILE_SIZE_MB must not exceed {}",
                MAX_FILE_SIZE_MB_LIMIT
            ));
        }

        if self.max_dimension == 0 {
            return Err(anyhow::anyhow!("MAX_DIMENSION must be greater than 0"));
        }

        for category in StorageCategory::ALL {
            if !self.upload_dirs.contains_key(&category) {
                return Err(anyhow::anyhow!(
                    "No upload directory configured for {}",
                    category
                ));
            }
        }

        let dirs: Vec<&PathBuf> = self.upload_dirs.values().collect();
        for (i, dir) in dirs.iter().enumerate() {
            if dirs[i + 1..].contains(dir) {
                return Err(anyhow::anyhow!(
                    "Upload directory {} is shared by more than one category",
                    dir.display()
                ));
            }
            if **dir == self.cache_dir || **dir == self.staging_dir {
                return Err(anyhow::anyhow!(
                    "Upload directory {} must differ from the cache and staging directories",
                    dir.display()
                ));
            }
        }

        if self.cache_dir == self.staging_dir {
            return Err(anyhow::anyhow!(
                "CACHE_DIR and STAGING_DIR must be different directories"
            ));
        }

        Ok(())
    }
}
