use super::codec_name;
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::FormatProber;
use async_trait::async_trait;
use image::ImageReader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Identifies images by magic bytes and checks that the header decodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProber;

impl ImageProber {
    pub fn new() -> Self {
        Self
    }

    fn probe_blocking(path: &Path) -> ProcessingResult<String> {
        let file = File::open(path)
            .map_err(|e| ProcessingError::ProbeFailure(format!("cannot open file: {}", e)))?;

        // No format hint from the path: the content alone decides.
        let reader = ImageReader::new(BufReader::new(file))
            .with_guessed_format()
            .map_err(|e| ProcessingError::ProbeFailure(format!("cannot read file: {}", e)))?;

        let format = reader
            .format()
            .ok_or_else(|| ProcessingError::ProbeFailure("unrecognized format".to_string()))?;

        // A recognizable signature over a broken header is still unprobeable.
        reader
            .into_dimensions()
            .map_err(|e| ProcessingError::ProbeFailure(format!("corrupt header: {}", e)))?;

        Ok(codec_name(format))
    }
}

#[async_trait]
impl FormatProber for ImageProber {
    #[tracing::instrument(skip(self))]
    async fn probe(&self, path: &Path) -> ProcessingResult<String> {
        let path: PathBuf = path.to_path_buf();
        let codec = tokio::task::spawn_blocking(move || Self::probe_blocking(&path))
            .await
            .map_err(|e| ProcessingError::ProbeFailure(format!("probe task failed: {}", e)))??;

        tracing::debug!(codec = %codec, "Image probed");
        Ok(codec)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
