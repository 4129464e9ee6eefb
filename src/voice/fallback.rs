//! On-device speech synthesizer used when remote speech is unavailable

use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Platform speech commands, in order of preference
const CANDIDATES: &[&str] = &["say", "spd-say", "espeak-ng", "espeak"];

/// Last-resort speech output
///
/// Infallible by signature: whatever happens, the caller is not told.
pub trait FallbackSpeaker: Send + Sync {
    /// Speak `text`, fire-and-forget
    fn speak(&self, text: &str);
}

/// Speaks through the platform's speech command
#[derive(Debug, Clone, Default)]
pub struct LocalSynthesizer {
    command: Option<PathBuf>,
}

impl LocalSynthesizer {
    /// Use the first speech command found on `PATH`
    #[must_use]
    pub fn detect() -> Self {
        let command = CANDIDATES.iter().find_map(|c| which::which(c).ok());

        match &command {
            Some(path) => tracing::debug!(command = %path.display(), "local synthesizer found"),
            None => tracing::warn!("no local speech command found, fallback speech is silent"),
        }

        Self { command }
    }

    /// Use a specific command, resolved on `PATH` when not a path
    #[must_use]
    pub fn with_command(command: &str) -> Self {
        let path = which::which(command).unwrap_or_else(|_| PathBuf::from(command));
        Self {
            command: Some(path),
        }
    }

    /// Use `command` if given, otherwise detect
    #[must_use]
    pub fn from_config(command: Option<&str>) -> Self {
        command.map_or_else(Self::detect, Self::with_command)
    }

    /// Command that will be run, if any
    #[must_use]
    pub fn command(&self) -> Option<&Path> {
        self.command.as_deref()
    }
}

impl FallbackSpeaker for LocalSynthesizer {
    fn speak(&self, text: &str) {
        let Some(command) = &self.command else {
            tracing::warn!(text, "no local synthesizer available");
            return;
        };

        // Needs a Tokio runtime so the child is reaped in the background
        match tokio::process::Command::new(command)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                tracing::debug!(command = %command.display(), pid = ?child.id(), "local speech started");
            }
            Err(e) => {
                tracing::warn!(command = %command.display(), error = %e, "local speech failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_kept_when_not_on_path() {
        let synth = LocalSynthesizer::with_command("/opt/voices/bin/speak-now");
        assert_eq!(synth.command(), Some(Path::new("/opt/voices/bin/speak-now")));
    }

    #[tokio::test]
    async fn silent_synthesizer_does_not_panic() {
        LocalSynthesizer::default().speak("hello");
    }

    #[tokio::test]
    async fn missing_binary_is_swallowed() {
        LocalSynthesizer::with_command("/nonexistent/quickspeak-tts").speak("hello");
    }
}
