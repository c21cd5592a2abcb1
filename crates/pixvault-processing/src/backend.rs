//! Builds the prober/transcoder pair selected by `MEDIA_BACKEND`.

use crate::ffmpeg::{FfmpegTranscoder, FfprobeProber};
use crate::traits::{FormatProber, Transcoder};
use pixvault_core::{Config, MediaBackend};
use std::sync::Arc;

pub struct MediaTools {
    pub prober: Arc<dyn FormatProber>,
    pub transcoder: Arc<dyn Transcoder>,
}

pub fn build_media_tools(config: &Config) -> anyhow::Result<MediaTools> {
    let tools = match config.media_backend() {
        MediaBackend::Ffmpeg => MediaTools {
            prober: Arc::new(FfprobeProber::new(
                config.ffprobe_path(),
                config.probe_timeout(),
            )?),
            transcoder: Arc::new(FfmpegTranscoder::new(
                config.ffmpeg_path(),
                config.transcode_timeout(),
            )?),
        },
        #[cfg(feature = "native")]
        MediaBackend::Native => MediaTools {
            prober: Arc::new(crate::native::ImageProber::new()),
            transcoder: Arc::new(crate::native::ImageTranscoder::new(
                config.transcode_timeout(),
            )),
        },
        #[cfg(not(feature = "native"))]
        MediaBackend::Native => {
            anyhow::bail!("MEDIA_BACKEND=native requires the `native` feature")
        }
    };

    tracing::info!(
        backend = %config.media_backend(),
        prober = tools.prober.name(),
        transcoder = tools.transcoder.name(),
        "Media backend initialized"
    );

    Ok(tools)
}
