use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Media backend types
///
/// Selects which implementation probes and resizes images. It's defined in core
/// because it's part of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    /// `ffprobe` / `ffmpeg` subprocesses
    Ffmpeg,
    /// In-process decoding with the `image` crate
    Native,
}

impl FromStr for MediaBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ffmpeg" => Ok(MediaBackend::Ffmpeg),
            "native" => Ok(MediaBackend::Native),
            _ => Err(anyhow::anyhow!("Invalid media backend: {}", s)),
        }
    }
}

impl Display for MediaBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaBackend::Ffmpeg => write!(f, "ffmpeg"),
            MediaBackend::Native => write!(f, "native"),
        }
    }
}
