//! TOML configuration file loading
//!
//! Supports `~/.config/quickspeak/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct QuickSpeakConfigFile {
    /// Remote generation API settings
    #[serde(default)]
    pub api: ApiFileConfig,

    /// Suggestion router settings
    #[serde(default)]
    pub router: RouterFileConfig,

    /// Speech playback settings
    #[serde(default)]
    pub speech: SpeechFileConfig,
}

/// Remote API configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    /// API credential
    pub key: Option<String>,

    /// Base URL (e.g. `https://generativelanguage.googleapis.com`)
    pub base_url: Option<String>,

    /// Model used for phrase generation
    pub text_model: Option<String>,

    /// Model used for speech generation
    pub tts_model: Option<String>,
}

/// Suggestion router configuration
#[derive(Debug, Default, Deserialize)]
pub struct RouterFileConfig {
    /// Quiet period before a query is routed
    pub debounce_ms: Option<u64>,
}

/// Speech playback configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Prebuilt voice name (e.g. "Fenrir")
    pub voice: Option<String>,

    /// Delay before Playing/Error revert to Idle
    pub reset_delay_ms: Option<u64>,

    /// Local synthesizer command used when remote speech fails
    pub fallback_command: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `QuickSpeakConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> QuickSpeakConfigFile {
    config_file_path().map_or_else(QuickSpeakConfigFile::default, |path| load_from(&path))
}

/// Load a config file from an explicit path, falling back to defaults
pub fn load_from(path: &Path) -> QuickSpeakConfigFile {
    if !path.exists() {
        return QuickSpeakConfigFile::default();
    }

    match read_config(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            QuickSpeakConfigFile::default()
        }
    }
}

/// Read and parse a config file
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config(path: &Path) -> Result<QuickSpeakConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/quickspeak/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("quickspeak").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_from(&dir.path().join("nope.toml"));
        assert!(fc.api.key.is_none());
        assert!(fc.router.debounce_ms.is_none());
    }

    #[test]
    fn partial_file_overlays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[router]\ndebounce_ms = 250\n\n[speech]\nvoice = \"Kore\"\n",
        )
        .unwrap();

        let fc = load_from(&path);
        assert_eq!(fc.router.debounce_ms, Some(250));
        assert_eq!(fc.speech.voice.as_deref(), Some("Kore"));
        assert!(fc.api.base_url.is_none());
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[router\ndebounce_ms = ").unwrap();

        let fc = load_from(&path);
        assert!(fc.router.debounce_ms.is_none());
        assert!(matches!(read_config(&path), Err(crate::Error::Toml(_))));
    }

    #[test]
    fn unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_config(dir.path()), Err(crate::Error::Io(_))));
        assert!(load_from(dir.path()).api.key.is_none());
    }
}
