//! Error types for QuickSpeak

use thiserror::Error;

/// Result type alias for QuickSpeak operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the simulator
///
/// Most of these never reach the user: generation and playback failures are
/// converted into typed defaults or the local synthesizer at the component
/// boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio output error
    #[error("audio error: {0}")]
    Audio(String),

    /// Text generation error (suggestions, context packs)
    #[error("generation error: {0}")]
    Generation(String),

    /// Speech generation error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Base64 payload error
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}
