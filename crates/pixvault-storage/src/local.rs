use crate::error::{StorageError, StorageResult};
use pixvault_core::{Config, StorageCategory};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem layout for originals, candidate uploads and cached variants.
#[derive(Clone, Debug)]
pub struct AssetStore {
    upload_dirs: BTreeMap<StorageCategory, PathBuf>,
    staging_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AssetStore {
    /// Create a new AssetStore, creating every directory that does not exist yet.
    pub async fn new(
        upload_dirs: BTreeMap<StorageCategory, PathBuf>,
        staging_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let store = AssetStore {
            upload_dirs,
            staging_dir: staging_dir.into(),
            cache_dir: cache_dir.into(),
        };

        for dir in store.all_dirs() {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(store)
    }

    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        Self::new(
            config.upload_dirs().clone(),
            config.staging_dir(),
            config.cache_dir(),
        )
        .await
    }

    fn all_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        self.upload_dirs
            .values()
            .chain([&self.staging_dir, &self.cache_dir])
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn category_dir(&self, category: StorageCategory) -> StorageResult<&Path> {
        self.upload_dirs
            .get(&category)
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                StorageError::ConfigError(format!("No directory configured for {}", category))
            })
    }

    /// Path of an original asset. Does not check that it exists.
    pub fn original_path(&self, category: StorageCategory, file_name: &str) -> StorageResult<PathBuf> {
        validate_file_name(file_name)?;
        Ok(self.category_dir(category)?.join(file_name))
    }

    /// Path of a cached variant. Does not check that it exists.
    pub fn cache_path(&self, cache_file_name: &str) -> StorageResult<PathBuf> {
        validate_file_name(cache_file_name)?;
        Ok(self.cache_dir.join(cache_file_name))
    }

    /// Write a candidate upload into the staging directory.
    ///
    /// Fails if a file with the same name is already staged.
    pub async fn write_candidate(&self, file_name: &str, data: &[u8]) -> StorageResult<PathBuf> {
        validate_file_name(file_name)?;
        let path = self.staging_dir.join(file_name);
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
            })?;

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to write file {}: {}",
                path.display(),
                e
            )));
        }

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Candidate upload staged"
        );

        Ok(path)
    }

    /// Move an accepted candidate into its category directory.
    pub async fn promote(
        &self,
        candidate: &Path,
        category: StorageCategory,
        file_name: &str,
    ) -> StorageResult<PathBuf> {
        let destination = self.original_path(category, file_name)?;

        if fs::try_exists(&destination).await.unwrap_or(false) {
            return Err(StorageError::WriteFailed(format!(
                "Refusing to overwrite existing asset {}",
                destination.display()
            )));
        }

        if let Err(rename_err) = fs::rename(candidate, &destination).await {
            // Staging may live on another filesystem; fall back to copy + remove.
            tracing::debug!(
                error = %rename_err,
                from = %candidate.display(),
                to = %destination.display(),
                "Rename failed, copying instead"
            );
            copy_into_place(candidate, &destination).await?;
        }

        tracing::info!(
            category = %category,
            file_name = %file_name,
            path = %destination.display(),
            "Upload promoted to original asset"
        );

        Ok(destination)
    }

    /// Delete a file. A file that is already gone is not an error.
    pub async fn discard(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Check that every directory exists and accepts new files.
    pub async fn check_writable(&self) -> StorageResult<()> {
        for dir in self.all_dirs() {
            let probe = dir.join(format!(".write-check-{}", uuid::Uuid::new_v4().simple()));
            fs::write(&probe, b"").await.map_err(|e| {
                StorageError::WriteFailed(format!("{} is not writable: {}", dir.display(), e))
            })?;
            let _ = fs::remove_file(&probe).await;
        }
        Ok(())
    }
}

/// Copy `from` to `to`, then remove `from`.
///
/// A failed copy removes whatever reached `to`, so no truncated file is left
/// in a served directory. Once the copy succeeded the asset is live, and a
/// leftover source is only logged.
async fn copy_into_place(from: &Path, to: &Path) -> StorageResult<()> {
    if let Err(e) = fs::copy(from, to).await {
        if let Err(remove_err) = fs::remove_file(to).await {
            if remove_err.kind() != std::io::ErrorKind::NotFound {
                tracing::error!(
                    error = %remove_err,
                    path = %to.display(),
                    "Failed to remove partial copy"
                );
            }
        }
        return Err(StorageError::WriteFailed(format!(
            "Failed to copy {} to {}: {}",
            from.display(),
            to.display(),
            e
        )));
    }

    if let Err(e) = fs::remove_file(from).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::error!(
                error = %e,
                path = %from.display(),
                "Failed to remove staged file after copy"
            );
        }
    }
    Ok(())
}

/// Reject names that could escape their directory or hide as dotfiles.
pub fn validate_file_name(file_name: &str) -> StorageResult<()> {
    let invalid = file_name.is_empty()
        || file_name.len() > 255
        || file_name.starts_with('.')
        || file_name.contains("..")
        || file_name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(StorageError::InvalidName(file_name.to_string()));
    }
    Ok(())
}
