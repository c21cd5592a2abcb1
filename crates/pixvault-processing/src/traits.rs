//! Seams between the core mechanisms and the tools that touch pixels.

use crate::error::ProcessingResult;
use async_trait::async_trait;
use pixvault_core::ResizeRequest;
use std::path::Path;

/// Determines the codec of the bytes on disk, ignoring the file name.
#[async_trait]
pub trait FormatProber: Send + Sync {
    /// Lowercase codec identifier of the first image/video stream.
    async fn probe(&self, path: &Path) -> ProcessingResult<String>;

    fn name(&self) -> &'static str;

    /// Whether the prober can currently run (e.g. its binary is reachable).
    async fn health_check(&self) -> ProcessingResult<()> {
        Ok(())
    }
}

/// Scales a source image into a new file.
///
/// When only one dimension is given the other follows the source aspect ratio.
/// The output format is chosen from the destination extension.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        source: &Path,
        destination: &Path,
        resize: ResizeRequest,
    ) -> ProcessingResult<()>;

    fn name(&self) -> &'static str;
}
