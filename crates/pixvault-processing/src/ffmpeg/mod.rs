//! Subprocess adapters around the ffprobe and ffmpeg binaries.

mod prober;
mod transcoder;

pub use prober::FfprobeProber;
pub use transcoder::FfmpegTranscoder;

use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Why a subprocess did not produce output.
#[derive(Debug)]
pub(crate) enum RunError {
    Spawn(std::io::Error),
    TimedOut(Duration),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Spawn(e) => write!(f, "failed to execute: {}", e),
            RunError::TimedOut(t) => write!(f, "timed out after {}s", t.as_secs_f64()),
        }
    }
}

/// Run a program without a shell, killing it if `timeout` elapses first.
pub(crate) async fn run(program: &str, args: &[String], timeout: Duration) -> Result<Output, RunError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, child).await {
        Ok(result) => result.map_err(RunError::Spawn),
        Err(_) => Err(RunError::TimedOut(timeout)),
    }
}

/// Reject executable paths carrying shell metacharacters.
pub(crate) fn validate_executable(path: &str) -> anyhow::Result<()> {
    if path.is_empty() {
        anyhow::bail!("Executable path is empty");
    }
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        anyhow::bail!("Executable path contains dangerous characters: {}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_executable() {
        assert!(validate_executable("ffprobe").is_ok());
        assert!(validate_executable("/usr/local/bin/ffmpeg").is_ok());
        assert!(validate_executable("").is_err());
        assert!(validate_executable("ffmpeg; rm -rf /").is_err());
        assert!(validate_executable("$(ffmpeg)").is_err());
    }

    #[tokio::test]
    async fn test_run_missing_binary() {
        let result = run(
            "pixvault-definitely-not-a-binary",
            &[],
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(result, Err(RunError::Spawn(_))));
    }
}
