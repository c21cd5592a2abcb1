use super::{run, validate_executable};
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::FormatProber;
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};

/// Reads the codec of the first video stream with `ffprobe`.
pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let ffprobe_path = ffprobe_path.into();
        validate_executable(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }

    pub(crate) fn build_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=codec_name".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// First non-empty line of ffprobe's output, lowercased.
    pub(crate) fn parse_codec(stdout: &[u8]) -> Option<String> {
        String::from_utf8_lossy(stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

#[async_trait]
impl FormatProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
    ))]
    async fn probe(&self, path: &Path) -> ProcessingResult<String> {
        let start = Instant::now();
        let args = Self::build_args(path);

        let output = run(&self.ffprobe_path, &args, self.timeout)
            .await
            .map_err(|e| ProcessingError::ProbeFailure(format!("ffprobe {}", e)))?;

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(
                exit_code = ?output.status.code(),
                duration_ms = duration_ms,
                stderr = %stderr.trim(),
                "ffprobe rejected file"
            );
            return Err(ProcessingError::ProbeFailure(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let codec = Self::parse_codec(&output.stdout).ok_or_else(|| {
            ProcessingError::ProbeFailure("no image stream found".to_string())
        })?;

        tracing::debug!(codec = %codec, duration_ms = duration_ms, "ffprobe completed");
        Ok(codec)
    }

    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn health_check(&self) -> ProcessingResult<()> {
        let output = run(&self.ffprobe_path, &["-version".to_string()], self.timeout)
            .await
            .map_err(|e| ProcessingError::ProbeFailure(format!("ffprobe {}", e)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ProcessingError::ProbeFailure(format!(
                "ffprobe -version exited with {}",
                output.status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let args = FfprobeProber::build_args(Path::new("/tmp/a b.png"));
        assert_eq!(
            args,
            vec![
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=codec_name",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                "/tmp/a b.png",
            ]
        );
    }

    #[test]
    fn test_parse_codec() {
        assert_eq!(FfprobeProber::parse_codec(b"PNG\n"), Some("png".to_string()));
        assert_eq!(
            FfprobeProber::parse_codec(b"\n  mjpeg  \nextra\n"),
            Some("mjpeg".to_string())
        );
        assert_eq!(FfprobeProber::parse_codec(b""), None);
        assert_eq!(FfprobeProber::parse_codec(b"\n \n"), None);
    }

    #[test]
    fn test_new_rejects_shell_metacharacters() {
        assert!(FfprobeProber::new("ffprobe | sh", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_failure() {
        let prober =
            FfprobeProber::new("pixvault-missing-ffprobe", Duration::from_secs(5)).unwrap();
        let result = prober.probe(Path::new("/tmp/whatever.png")).await;
        assert!(matches!(result, Err(ProcessingError::ProbeFailure(_))));
        assert!(prober.health_check().await.is_err());
    }
}
