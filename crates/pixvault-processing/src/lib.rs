//! Pixvault Media Processing Library
//!
//! The two mechanisms with real design weight live here:
//!
//! - [`MediaValidationGate`] decides from the probed codec whether a candidate
//!   upload may become an original asset,
//! - [`VariantResolver`] serves originals or lazily produces resized variants,
//!   running at most one transcode per cache key at a time.
//!
//! Both talk to the outside world through [`FormatProber`] and [`Transcoder`].
//! The `ffmpeg` adapters drive the external binaries; the `native` adapters
//! (feature `native`) use the `image` crate in-process.

pub mod backend;
pub mod error;
pub mod ffmpeg;
pub mod traits;
pub mod validator;
pub mod variant;

#[cfg(feature = "native")]
pub mod native;

// Re-export commonly used types
pub use backend::{build_media_tools, MediaTools};
pub use error::{ProcessingError, ProcessingResult};
pub use ffmpeg::{FfmpegTranscoder, FfprobeProber};
pub use traits::{FormatProber, Transcoder};
pub use validator::{MediaValidationGate, ValidationVerdict};
pub use variant::{ResolvedVariant, VariantResolver, VariantSource};

#[cfg(feature = "native")]
pub use native::{ImageProber, ImageTranscoder};
