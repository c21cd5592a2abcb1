use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::Transcoder;
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use pixvault_core::ResizeRequest;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Decodes, resizes and re-encodes on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct ImageTranscoder {
    timeout: Duration,
}

impl ImageTranscoder {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Target size; a missing side follows the source aspect ratio.
    pub fn target_dimensions(orig_width: u32, orig_height: u32, resize: ResizeRequest) -> (u32, u32) {
        match (resize.width, resize.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => {
                let aspect_ratio = orig_height as f64 / orig_width.max(1) as f64;
                let h = (w as f64 * aspect_ratio).round() as u32;
                (w, h.max(1))
            }
            (None, Some(h)) => {
                let aspect_ratio = orig_width as f64 / orig_height.max(1) as f64;
                let w = (h as f64 * aspect_ratio).round() as u32;
                (w.max(1), h)
            }
            (None, None) => (orig_width, orig_height),
        }
    }

    /// Cheaper filters for large reductions.
    fn select_filter(orig_width: u32, orig_height: u32, new_width: u32, new_height: u32) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// The output is encoded in memory and only written if `cancelled` is
    /// still false; the flag stays locked during the write, so once the async
    /// side has set it no file can appear.
    fn transcode_blocking(
        source: &Path,
        destination: &Path,
        resize: ResizeRequest,
        cancelled: &Mutex<bool>,
    ) -> ProcessingResult<()> {
        let reader = ImageReader::open(source)
            .map_err(|e| ProcessingError::TranscodeFailure(format!("cannot open source: {}", e)))?
            .with_guessed_format()
            .map_err(|e| ProcessingError::TranscodeFailure(format!("cannot read source: {}", e)))?;
        let source_format = reader.format();

        let img = reader
            .decode()
            .map_err(|e| ProcessingError::TranscodeFailure(format!("decode failed: {}", e)))?;

        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = Self::target_dimensions(orig_width, orig_height, resize);
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        let resized = img.resize_exact(width, height, filter);

        let format = ImageFormat::from_path(destination)
            .ok()
            .or(source_format)
            .ok_or_else(|| {
                ProcessingError::TranscodeFailure("cannot determine output format".to_string())
            })?;

        // JPEG has no alpha channel.
        let resized = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            _ => resized,
        };

        let mut encoded = Cursor::new(Vec::new());
        resized
            .write_to(&mut encoded, format)
            .map_err(|e| ProcessingError::TranscodeFailure(format!("encode failed: {}", e)))?;

        let cancelled = cancelled
            .lock()
            .map_err(|_| ProcessingError::TranscodeFailure("cancel flag poisoned".to_string()))?;
        if *cancelled {
            return Err(ProcessingError::TranscodeFailure(
                "cancelled before write".to_string(),
            ));
        }
        std::fs::write(destination, encoded.into_inner())
            .map_err(|e| ProcessingError::TranscodeFailure(format!("write failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Transcoder for ImageTranscoder {
    #[tracing::instrument(skip(self, source, destination), fields(
        width = ?resize.width,
        height = ?resize.height,
    ))]
    async fn transcode(
        &self,
        source: &Path,
        destination: &Path,
        resize: ResizeRequest,
    ) -> ProcessingResult<()> {
        let start = Instant::now();
        let source: PathBuf = source.to_path_buf();
        let destination: PathBuf = destination.to_path_buf();

        let cancelled = Arc::new(Mutex::new(false));
        let job_cancelled = cancelled.clone();

        let task = tokio::task::spawn_blocking(move || {
            Self::transcode_blocking(&source, &destination, resize, &job_cancelled)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                return Err(ProcessingError::TranscodeFailure(format!(
                    "transcode task failed: {}",
                    e
                )))
            }
            Err(_) => {
                // The job may still be running; make sure it never writes.
                // Waits out a write already in progress.
                let _ = tokio::task::spawn_blocking(move || {
                    if let Ok(mut flag) = cancelled.lock() {
                        *flag = true;
                    }
                })
                .await;
                return Err(ProcessingError::TranscodeFailure(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                )))
            }
        }

        tracing::debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image resized"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
