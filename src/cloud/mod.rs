//! Remote generation services
//!
//! The simulator talks to two hosted capabilities: phrase generation (text in,
//! list of short phrases out) and speech generation (phrase in, encoded PCM
//! out). Both sit behind traits so the router and the playback adapter can be
//! driven by fakes in tests.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::Result;

/// Produces short phrases from a natural-language prompt
#[async_trait]
pub trait PhraseGenerator: Send + Sync {
    /// Ask the service for a list of phrases
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response has no usable list
    async fn generate_phrases(&self, prompt: &str) -> Result<Vec<String>>;
}

/// Encoded audio returned by a speech service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechPayload {
    /// Base64 text of the raw sample bytes
    pub data: String,
    /// Declared MIME type, e.g. `audio/L16;codec=pcm;rate=24000`
    pub mime_type: Option<String>,
}

/// Turns a phrase into encoded speech audio
#[async_trait]
pub trait SpeechGenerator: Send + Sync {
    /// Request synthesized audio for `text`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no audio payload is present
    async fn generate_speech(&self, text: &str) -> Result<SpeechPayload>;
}
