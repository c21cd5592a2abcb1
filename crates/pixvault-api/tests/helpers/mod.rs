//! Test helpers: build AppState and router for integration tests.
//!
//! Every app gets its own temp directory tree and runs the native backend, so
//! no external binaries are needed.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use axum_test::TestServer;
use pixvault_api::setup::{build_state, routes};
use pixvault_api::AppState;
use pixvault_core::{Config, MediaServerConfig, ResizeRequest, StorageCategory};
use pixvault_processing::{ImageProber, ImageTranscoder, ProcessingResult, Transcoder};
use pixvault_storage::AssetStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Native transcoder that counts how often it actually runs.
pub struct CountingTranscoder {
    inner: ImageTranscoder,
    calls: AtomicUsize,
}

impl CountingTranscoder {
    fn new() -> Self {
        Self {
            inner: ImageTranscoder::new(Duration::from_secs(30)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for CountingTranscoder {
    async fn transcode(
        &self,
        source: &Path,
        destination: &Path,
        resize: ResizeRequest,
    ) -> ProcessingResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.transcode(source, destination, resize).await
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub transcoder: Arc<CountingTranscoder>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn transcode_calls(&self) -> usize {
        self.transcoder.calls()
    }

    pub fn category_dir(&self, category: StorageCategory) -> PathBuf {
        self.state.config.upload_dir(category).unwrap().to_path_buf()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.state.config.cache_dir().to_path_buf()
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.state.config.staging_dir().to_path_buf()
    }
}

fn test_config(root: &Path) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("UPLOAD_ROOT", root.join("uploads").display().to_string()),
        ("STAGING_DIR", root.join("staging").display().to_string()),
        ("CACHE_DIR", root.join("cache").display().to_string()),
        ("MEDIA_BACKEND", "native".to_string()),
        ("MAX_FILE_SIZE_MB", "1".to_string()),
        ("CACHE_MAX_AGE_SECS", "3600".to_string()),
    ]);
    let media = MediaServerConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("test config should parse");
    Config(Box::new(media))
}

/// Setup a test app over a fresh temp directory.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config(temp_dir.path());

    let store = AssetStore::from_config(&config)
        .await
        .expect("storage directories");
    let transcoder = Arc::new(CountingTranscoder::new());
    let state = build_state(
        config.clone(),
        store,
        Arc::new(ImageProber::new()),
        transcoder.clone(),
    );

    let router = routes::setup_routes(&config, state.clone()).expect("routes");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        state,
        transcoder,
        _temp_dir: temp_dir,
    }
}

/// Number of regular files directly inside `dir`.
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}
