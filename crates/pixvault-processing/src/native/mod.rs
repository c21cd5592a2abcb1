//! In-process prober and transcoder built on the `image` crate.
//!
//! Codec names follow ffprobe's vocabulary so the same allow-list works for
//! both backends.

mod prober;
mod transcoder;

pub use prober::ImageProber;
pub use transcoder::ImageTranscoder;

use image::ImageFormat;

/// ffprobe's codec name for an `image` format.
pub fn codec_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "mjpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Avif => "av1".to_string(),
        other => other
            .extensions_str()
            .first()
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| format!("{:?}", other).to_ascii_lowercase()),
    }
}
