//! Media Validation Gate
//!
//! The single authority on whether a candidate upload may become an original
//! asset. The prober's verdict on the bytes is compared with an allow-list;
//! extensions and client-declared content types play no part. A rejected
//! candidate is deleted before the error is returned.

use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::FormatProber;
use std::path::Path;
use std::sync::Arc;

/// Outcome of inspecting one candidate. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub codec: String,
    pub accepted: bool,
}

pub struct MediaValidationGate {
    prober: Arc<dyn FormatProber>,
    allowed_codecs: Vec<String>,
}

impl MediaValidationGate {
    pub fn new(prober: Arc<dyn FormatProber>, allowed_codecs: &[String]) -> Self {
        Self {
            prober,
            allowed_codecs: allowed_codecs
                .iter()
                .map(|c| c.trim().to_ascii_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    pub fn allowed_codecs(&self) -> &[String] {
        &self.allowed_codecs
    }

    pub fn prober(&self) -> &Arc<dyn FormatProber> {
        &self.prober
    }

    /// Compare a probed codec with the allow-list.
    pub fn evaluate(&self, codec: &str) -> ValidationVerdict {
        let codec = codec.trim().to_ascii_lowercase();
        let accepted = self.allowed_codecs.iter().any(|allowed| *allowed == codec);
        ValidationVerdict { codec, accepted }
    }

    /// Probe `candidate` and admit or reject it.
    ///
    /// On rejection the file is removed from disk first. A failed removal is
    /// logged and does not change the outcome.
    #[tracing::instrument(skip(self), fields(prober = self.prober.name()))]
    pub async fn validate(&self, candidate: &Path) -> ProcessingResult<ValidationVerdict> {
        let rejection = match self.prober.probe(candidate).await {
            Ok(codec) => {
                let verdict = self.evaluate(&codec);
                if verdict.accepted {
                    tracing::info!(codec = %verdict.codec, "Candidate upload accepted");
                    return Ok(verdict);
                }
                ProcessingError::UnsupportedCodec(verdict.codec)
            }
            Err(ProcessingError::ProbeFailure(reason)) => ProcessingError::ProbeFailure(reason),
            Err(other) => ProcessingError::ProbeFailure(other.to_string()),
        };

        tracing::warn!(error = %rejection, "Candidate upload rejected");
        Self::discard(candidate).await;
        Err(rejection)
    }

    async fn discard(candidate: &Path) {
        match tokio::fs::remove_file(candidate).await {
            Ok(()) => {
                tracing::debug!(path = %candidate.display(), "Rejected candidate deleted");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %candidate.display(),
                    "Failed to delete rejected candidate"
                );
            }
        }
    }
}
