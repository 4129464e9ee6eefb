//! Configuration management for QuickSpeak

pub mod file;

use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

/// Default base URL of the generative API
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for phrase generation
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Default model for speech generation
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default prebuilt voice (deep, calm)
pub const DEFAULT_VOICE: &str = "Fenrir";

/// Default suggestion debounce window
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default delay before the playback indicator reverts to idle
pub const DEFAULT_RESET_DELAY_MS: u64 = 2000;

/// QuickSpeak configuration
#[derive(Debug)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,

    /// Suggestion router configuration
    pub router: RouterConfig,

    /// Speech playback configuration
    pub speech: SpeechConfig,
}

/// Remote generation API configuration
#[derive(Debug)]
pub struct ApiConfig {
    /// API credential; calls fail (and fall back) without one
    pub key: Option<SecretString>,

    /// Base URL, without trailing slash
    pub base_url: String,

    /// Model for suggestions and context packs
    pub text_model: String,

    /// Model for speech generation
    pub tts_model: String,
}

/// Suggestion router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Quiet period an input must be stable for before it is routed
    pub debounce: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Speech playback configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Prebuilt voice name for remote speech
    pub voice: String,

    /// Delay before Playing/Error revert to Idle
    pub reset_delay: Duration,

    /// Local synthesizer command; auto-detected when `None`
    pub fallback_command: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            reset_delay: Duration::from_millis(DEFAULT_RESET_DELAY_MS),
            fallback_command: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the optional TOML file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |name| std::env::var(name).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// Precedence is env > toml > default.
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn from_sources<F>(fc: file::QuickSpeakConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = env("GEMINI_API_KEY")
            .or_else(|| env("API_KEY"))
            .or(fc.api.key)
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        if key.is_none() {
            tracing::warn!("no API key configured, remote calls will use local fallbacks");
        }

        let base_url = env("QUICKSPEAK_API_URL")
            .or(fc.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!("invalid API base URL: {base_url}")));
        }

        let api = ApiConfig {
            key,
            base_url,
            text_model: env("QUICKSPEAK_TEXT_MODEL")
                .or(fc.api.text_model)
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            tts_model: env("QUICKSPEAK_TTS_MODEL")
                .or(fc.api.tts_model)
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
        };

        let debounce_ms = parse_millis(env("QUICKSPEAK_DEBOUNCE_MS"), "QUICKSPEAK_DEBOUNCE_MS")?
            .or(fc.router.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        let reset_delay_ms =
            parse_millis(env("QUICKSPEAK_RESET_DELAY_MS"), "QUICKSPEAK_RESET_DELAY_MS")?
                .or(fc.speech.reset_delay_ms)
                .unwrap_or(DEFAULT_RESET_DELAY_MS);

        let speech = SpeechConfig {
            voice: env("QUICKSPEAK_VOICE")
                .or(fc.speech.voice)
                .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            reset_delay: Duration::from_millis(reset_delay_ms),
            fallback_command: env("QUICKSPEAK_FALLBACK_TTS").or(fc.speech.fallback_command),
        };

        Ok(Self {
            api,
            router: RouterConfig {
                debounce: Duration::from_millis(debounce_ms),
            },
            speech,
        })
    }

    /// Whether an API credential is available
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api.key.is_some()
    }
}

fn parse_millis(value: Option<String>, name: &str) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{name}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::file::QuickSpeakConfigFile;
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_sources() {
        let config = Config::from_sources(QuickSpeakConfigFile::default(), env_from(&[])).unwrap();

        assert!(!config.has_api_key());
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.api.tts_model, DEFAULT_TTS_MODEL);
        assert_eq!(config.speech.voice, "Fenrir");
        assert_eq!(config.router.debounce, Duration::from_millis(500));
        assert_eq!(config.speech.reset_delay, Duration::from_millis(2000));
    }

    #[test]
    fn env_overrides_file() {
        let mut fc = QuickSpeakConfigFile::default();
        fc.api.key = Some("file-key".to_string());
        fc.router.debounce_ms = Some(100);
        fc.speech.voice = Some("Kore".to_string());

        let env = env_from(&[("GEMINI_API_KEY", "env-key"), ("QUICKSPEAK_DEBOUNCE_MS", "750")]);
        let config = Config::from_sources(fc, env).unwrap();

        assert_eq!(config.api.key.unwrap().expose_secret(), "env-key");
        assert_eq!(config.router.debounce, Duration::from_millis(750));
        assert_eq!(config.speech.voice, "Kore");
    }

    #[test]
    fn legacy_api_key_variable() {
        let config = Config::from_sources(
            QuickSpeakConfigFile::default(),
            env_from(&[("API_KEY", "legacy")]),
        )
        .unwrap();
        assert!(config.has_api_key());
    }

    #[test]
    fn blank_key_is_treated_as_missing() {
        let config = Config::from_sources(
            QuickSpeakConfigFile::default(),
            env_from(&[("GEMINI_API_KEY", "   ")]),
        )
        .unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn trailing_slash_trimmed_from_base_url() {
        let config = Config::from_sources(
            QuickSpeakConfigFile::default(),
            env_from(&[("QUICKSPEAK_API_URL", "http://localhost:9000/")]),
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
    }

    #[test]
    fn invalid_values_rejected() {
        let bad_ms = Config::from_sources(
            QuickSpeakConfigFile::default(),
            env_from(&[("QUICKSPEAK_DEBOUNCE_MS", "soon")]),
        );
        assert!(matches!(bad_ms, Err(Error::Config(_))));

        let bad_url = Config::from_sources(
            QuickSpeakConfigFile::default(),
            env_from(&[("QUICKSPEAK_API_URL", "ftp://example.com")]),
        );
        assert!(matches!(bad_url, Err(Error::Config(_))));
    }
}
