use super::{run, validate_executable};
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::Transcoder;
use async_trait::async_trait;
use pixvault_core::ResizeRequest;
use std::path::Path;
use std::time::{Duration, Instant};

/// Scales images with `ffmpeg -vf scale=W:H`.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_executable(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }

    /// `-1` lets ffmpeg derive the missing side from the aspect ratio.
    pub(crate) fn scale_filter(resize: ResizeRequest) -> String {
        let side = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "-1".to_string());
        format!("scale={}:{}", side(resize.width), side(resize.height))
    }

    /// Muxer and encoder for the destination. ffmpeg cannot guess them from
    /// an unknown or missing extension, so unrecognized names get PNG.
    pub(crate) fn output_format(destination: &Path) -> (&'static str, &'static str) {
        let extension = destination
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" | "jpe" | "jfif" => ("image2", "mjpeg"),
            "gif" => ("gif", "gif"),
            "webp" => ("webp", "libwebp"),
            "bmp" => ("image2", "bmp"),
            "tif" | "tiff" => ("image2", "tiff"),
            _ => ("image2", "png"),
        }
    }

    pub(crate) fn build_args(source: &Path, destination: &Path, resize: ResizeRequest) -> Vec<String> {
        let (muxer, codec) = Self::output_format(destination);
        let mut args: Vec<String> = vec![
            "-v".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-vf".to_string(),
            Self::scale_filter(resize),
        ];
        // image2 writes one file per frame unless told otherwise.
        if muxer == "image2" {
            args.extend(["-frames:v".to_string(), "1".to_string()]);
        }
        args.extend([
            "-c:v".to_string(),
            codec.to_string(),
            "-f".to_string(),
            muxer.to_string(),
            destination.to_string_lossy().to_string(),
        ]);
        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[tracing::instrument(skip(self, source, destination), fields(
        process.executable.name = "ffmpeg",
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
        let args = Self::build_args(source, destination, resize);

        let output = run(&self.ffmpeg_path, &args, self.timeout)
            .await
            .map_err(|e| ProcessingError::TranscodeFailure(format!("ffmpeg {}", e)))?;

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                exit_code = ?output.status.code(),
                duration_ms = duration_ms,
                stderr = %stderr.trim(),
                "ffmpeg failed"
            );
            return Err(ProcessingError::TranscodeFailure(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(duration_ms = duration_ms, "ffmpeg completed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
