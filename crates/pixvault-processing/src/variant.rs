//! Variant Resolver
//!
//! Maps `(category, file name, width, height)` to a file on disk:
//!
//! - no dimensions: the original itself,
//! - cache file present: that file,
//! - otherwise: transcode once into the cache and return the new file.
//!
//! Concurrent misses for the same cache key share one transcode. The transcode
//! runs in its own task, so it finishes even if every requester goes away, and
//! it writes to a temporary sibling that is renamed into place only on success.
//! A file at the cache path is therefore always complete.

use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::Transcoder;
use futures::future::{BoxFuture, FutureExt, Shared};
use pixvault_core::{AppError, ResizeRequest, StorageCategory};
use pixvault_storage::{
    cache_file_name, derive_cache_key, file_extension, AssetStore, StorageError,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

type SharedTranscode = Shared<BoxFuture<'static, Result<PathBuf, Arc<ProcessingError>>>>;

/// Where a resolved file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantSource {
    Original,
    CacheHit,
    Transcoded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    pub path: PathBuf,
    pub source: VariantSource,
}

impl ResolvedVariant {
    fn new(path: PathBuf, source: VariantSource) -> Self {
        Self { path, source }
    }
}

/// One pending transcode, as handed to the background task.
struct TranscodeJob {
    key: String,
    original: PathBuf,
    temp_path: PathBuf,
    cache_path: PathBuf,
    resize: ResizeRequest,
}

pub struct VariantResolver {
    store: AssetStore,
    transcoder: Arc<dyn Transcoder>,
    max_dimension: u32,
    in_flight: Arc<Mutex<HashMap<String, SharedTranscode>>>,
}

impl VariantResolver {
    pub fn new(store: AssetStore, transcoder: Arc<dyn Transcoder>, max_dimension: u32) -> Self {
        Self {
            store,
            transcoder,
            max_dimension,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of transcodes currently running.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    #[tracing::instrument(skip(self), fields(width = ?resize.width, height = ?resize.height))]
    pub async fn resolve(
        &self,
        category: StorageCategory,
        file_name: &str,
        resize: ResizeRequest,
    ) -> ProcessingResult<ResolvedVariant> {
        resize
            .validate(self.max_dimension)
            .map_err(|e| match e {
                AppError::InvalidInput(message) => ProcessingError::InvalidDimensions(message),
                other => ProcessingError::InvalidDimensions(other.to_string()),
            })?;

        let original = match self.store.original_path(category, file_name) {
            Ok(path) => path,
            Err(StorageError::InvalidName(name)) => return Err(ProcessingError::NotFound(name)),
            Err(e) => return Err(e.into()),
        };

        if !is_file(&original).await {
            return Err(ProcessingError::NotFound(format!("{}/{}", category, file_name)));
        }

        if resize.is_original() {
            return Ok(ResolvedVariant::new(original, VariantSource::Original));
        }

        let key = derive_cache_key(category, file_name, &resize);
        let cache_path = self
            .store
            .cache_path(&cache_file_name(category, file_name, &resize))?;

        if is_file(&cache_path).await {
            tracing::debug!(cache_key = %key, "Variant cache hit");
            return Ok(ResolvedVariant::new(cache_path, VariantSource::CacheHit));
        }

        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(existing) => {
                    tracing::debug!(cache_key = %key, "Joining in-flight transcode");
                    existing.clone()
                }
                None => {
                    // A flight may have finished between the first check and the lock.
                    if is_file(&cache_path).await {
                        return Ok(ResolvedVariant::new(cache_path, VariantSource::CacheHit));
                    }
                    let temp_name = format!("{}.partial-{}", key, Uuid::new_v4().simple());
                    let job = TranscodeJob {
                        key: key.clone(),
                        original,
                        temp_path: self
                            .store
                            .cache_dir()
                            .join(with_extension(&temp_name, file_extension(file_name))),
                        cache_path,
                        resize,
                    };
                    let flight = self.start_transcode(job);
                    in_flight.insert(key, flight.clone());
                    flight
                }
            }
        };

        flight
            .await
            .map(|path| ResolvedVariant::new(path, VariantSource::Transcoded))
            .map_err(|e| ProcessingError::from_shared(&e))
    }

    /// Spawn the transcode. The task removes its own map entry when done; it
    /// cannot do so before the caller inserts it because the caller holds the lock.
    fn start_transcode(&self, job: TranscodeJob) -> SharedTranscode {
        let transcoder = self.transcoder.clone();
        let in_flight = self.in_flight.clone();

        let handle = tokio::spawn(async move {
            let result = transcode_into_place(transcoder.as_ref(), &job).await;
            in_flight.lock().await.remove(&job.key);
            result.map(|()| job.cache_path).map_err(Arc::new)
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(Arc::new(ProcessingError::TranscodeFailure(format!(
                    "transcode task failed: {}",
                    e
                )))),
            }
        }
        .boxed()
        .shared()
    }
}

/// Transcode into the temporary path, then rename onto the cache path.
async fn transcode_into_place(transcoder: &dyn Transcoder, job: &TranscodeJob) -> ProcessingResult<()> {
    let start = Instant::now();

    let mut outcome = transcoder
        .transcode(&job.original, &job.temp_path, job.resize)
        .await;

    if outcome.is_ok() {
        outcome = if is_file(&job.temp_path).await {
            tokio::fs::rename(&job.temp_path, &job.cache_path)
                .await
                .map_err(|e| {
                    ProcessingError::TranscodeFailure(format!(
                        "failed to move variant into cache: {}",
                        e
                    ))
                })
        } else {
            Err(ProcessingError::TranscodeFailure(format!(
                "{} produced no output",
                transcoder.name()
            )))
        };
    }

    match &outcome {
        Ok(()) => {
            tracing::info!(
                cache_key = %job.key,
                transcoder = transcoder.name(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Variant cached"
            );
        }
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(&job.temp_path).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    tracing::error!(
                        error = %remove_err,
                        path = %job.temp_path.display(),
                        "Failed to remove partial variant"
                    );
                }
            }
            tracing::warn!(
                cache_key = %job.key,
                transcoder = transcoder.name(),
                error = %e,
                "Transcode failed"
            );
        }
    }

    outcome
}

fn with_extension(stem: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// Writes a marker instead of pixels and counts calls.
    #[derive(Default)]
    struct FakeTranscoder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn transcode(
            &self,
            _source: &Path,
            destination: &Path,
            resize: ResizeRequest,
        ) -> ProcessingResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            tokio::fs::write(destination, format!("{:?}", resize)).await?;
            if self.fail {
                return Err(ProcessingError::TranscodeFailure("boom".to_string()));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    async fn setup(transcoder: Arc<FakeTranscoder>) -> (TempDir, AssetStore, VariantResolver) {
        let dir = tempdir().unwrap();
        let mut dirs = BTreeMap::new();
        for category in StorageCategory::ALL {
            dirs.insert(category, dir.path().join(category.as_str()));
        }
        let store = AssetStore::new(dirs, dir.path().join(".staging"), dir.path().join("cache"))
            .await
            .unwrap();
        std::fs::write(dir.path().join("postImage").join("abc.png"), b"original").unwrap();

        let resolver = VariantResolver::new(store.clone(), transcoder, 8192);
        (dir, store, resolver)
    }

    fn cache_entries(store: &AssetStore) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(store.cache_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_no_dimensions_returns_original() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (dir, _store, resolver) = setup(transcoder.clone()).await;

        let resolved = resolver
            .resolve(StorageCategory::Post, "abc.png", ResizeRequest::default())
            .await
            .unwrap();

        assert_eq!(resolved.source, VariantSource::Original);
        assert_eq!(resolved.path, dir.path().join("postImage").join("abc.png"));
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (_dir, store, resolver) = setup(transcoder.clone()).await;
        let resize = ResizeRequest::new(Some(100), None);

        let first = resolver
            .resolve(StorageCategory::Post, "abc.png", resize)
            .await
            .unwrap();
        assert_eq!(first.source, VariantSource::Transcoded);

        let second = resolver
            .resolve(StorageCategory::Post, "abc.png", resize)
            .await
            .unwrap();
        assert_eq!(second.source, VariantSource::CacheHit);
        assert_eq!(first.path, second.path);
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 1);

        assert_eq!(
            cache_entries(&store),
            vec![cache_file_name(StorageCategory::Post, "abc.png", &resize)]
        );
        assert_eq!(resolver.in_flight().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_transcode() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (_dir, _store, resolver) = setup(transcoder.clone()).await;
        let resolver = Arc::new(resolver);
        let resize = ResizeRequest::new(Some(64), Some(64));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move {
                    resolver
                        .resolve(StorageCategory::Post, "abc.png", resize)
                        .await
                })
            })
            .collect();

        let mut paths = Vec::new();
        for task in tasks {
            paths.push(task.await.unwrap().unwrap().path);
        }

        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 1);
        assert!(paths.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_distinct_sizes_transcode_separately() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (_dir, store, resolver) = setup(transcoder.clone()).await;

        for resize in [
            ResizeRequest::new(Some(100), None),
            ResizeRequest::new(None, Some(100)),
            ResizeRequest::new(Some(100), Some(100)),
        ] {
            resolver
                .resolve(StorageCategory::Post, "abc.png", resize)
                .await
                .unwrap();
        }

        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache_entries(&store).len(), 3);
    }

    #[tokio::test]
    async fn test_missing_original_is_not_found() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (_dir, store, resolver) = setup(transcoder.clone()).await;

        let result = resolver
            .resolve(
                StorageCategory::Post,
                "missing.png",
                ResizeRequest::new(Some(100), None),
            )
            .await;

        assert!(matches!(result, Err(ProcessingError::NotFound(_))));
        assert!(cache_entries(&store).is_empty());
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_original_in_other_category_is_not_found() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (_dir, _store, resolver) = setup(transcoder).await;

        let result = resolver
            .resolve(StorageCategory::Profile, "abc.png", ResizeRequest::default())
            .await;
        assert!(matches!(result, Err(ProcessingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_traversal_name_is_not_found() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (_dir, _store, resolver) = setup(transcoder).await;

        let result = resolver
            .resolve(
                StorageCategory::Post,
                "../postImage/abc.png",
                ResizeRequest::default(),
            )
            .await;
        assert!(matches!(result, Err(ProcessingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_transcode_leaves_no_file() {
        let transcoder = Arc::new(FakeTranscoder {
            fail: true,
            ..Default::default()
        });
        let (_dir, store, resolver) = setup(transcoder.clone()).await;
        let resize = ResizeRequest::new(Some(100), None);

        let result = resolver
            .resolve(StorageCategory::Post, "abc.png", resize)
            .await;
        assert!(matches!(result, Err(ProcessingError::TranscodeFailure(_))));
        assert!(cache_entries(&store).is_empty());
        assert_eq!(resolver.in_flight().await, 0);

        // The failure is not cached; the next request tries again.
        let _ = resolver
            .resolve(StorageCategory::Post, "abc.png", resize)
            .await;
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_dimensions_rejected() {
        let transcoder = Arc::new(FakeTranscoder::default());
        let (_dir, _store, resolver) = setup(transcoder.clone()).await;

        for resize in [
            ResizeRequest::new(Some(0), None),
            ResizeRequest::new(None, Some(9000)),
        ] {
            let result = resolver
                .resolve(StorageCategory::Post, "abc.png", resize)
                .await;
            assert!(matches!(result, Err(ProcessingError::InvalidDimensions(_))));
        }
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
    }
}
