//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use quickspeak::config::{ApiConfig, RouterConfig, SpeechConfig};
use quickspeak::{
    AudioBuffer, AudioSink, Backends, DeviceSimulator, Error, FallbackSpeaker, PhraseGenerator,
    Result, SpeechGenerator, SpeechPayload,
};

/// API configuration pointing at a mock server
pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        key: Some("test-key".to_string().into()),
        base_url: base_url.trim_end_matches('/').to_string(),
        text_model: "gemini-2.5-flash".to_string(),
        tts_model: "gemini-2.5-flash-preview-tts".to_string(),
    }
}

/// Base64 little-endian PCM payload for `samples`
pub fn pcm_payload(samples: &[i16]) -> SpeechPayload {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    SpeechPayload {
        data: STANDARD.encode(bytes),
        mime_type: Some("audio/L16;codec=pcm;rate=24000".to_string()),
    }
}

/// Phrase generator answering every prompt the same way
pub struct ScriptedPhrases {
    reply: Option<Vec<String>>,
    delay: Duration,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedPhrases {
    pub fn answering(phrases: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(phrases.iter().map(ToString::to_string).collect()),
            delay: Duration::from_millis(20),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            delay: Duration::from_millis(20),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl PhraseGenerator for ScriptedPhrases {
    async fn generate_phrases(&self, prompt: &str) -> Result<Vec<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        tokio::time::sleep(self.delay).await;
        self.reply
            .clone()
            .ok_or_else(|| Error::Generation("service unavailable".to_string()))
    }
}

/// Speech generator returning a fixed payload, or failing without one
pub struct FixedSpeech {
    payload: Option<SpeechPayload>,
    pub calls: AtomicUsize,
}

impl FixedSpeech {
    pub fn returning(payload: SpeechPayload) -> Arc<Self> {
        Arc::new(Self {
            payload: Some(payload),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            payload: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SpeechGenerator for FixedSpeech {
    async fn generate_speech(&self, _text: &str) -> Result<SpeechPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.payload
            .clone()
            .ok_or_else(|| Error::Tts("no audio data received".to_string()))
    }
}

/// Sink that records buffers instead of playing them
#[derive(Default)]
pub struct RecordingSink {
    pub played: Mutex<Vec<AudioBuffer>>,
}

impl AudioSink for RecordingSink {
    fn play(&self, buffer: &AudioBuffer) -> Result<()> {
        self.played.lock().unwrap().push(buffer.clone());
        Ok(())
    }
}

/// Sink behaving like a machine without an output device
pub struct NoOutputSink;

impl AudioSink for NoOutputSink {
    fn play(&self, _buffer: &AudioBuffer) -> Result<()> {
        Err(Error::Audio("no output device available".to_string()))
    }
}

/// Fallback speaker that records phrases
#[derive(Default)]
pub struct RecordingFallback {
    pub spoken: Mutex<Vec<String>>,
}

impl FallbackSpeaker for RecordingFallback {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Simulator wired to fakes, with its recorders
pub struct TestDevice {
    pub sim: DeviceSimulator,
    pub phrases: Arc<ScriptedPhrases>,
    pub speech: Arc<FixedSpeech>,
    pub sink: Arc<RecordingSink>,
    pub fallback: Arc<RecordingFallback>,
}

pub fn test_device(phrases: Arc<ScriptedPhrases>, speech: Arc<FixedSpeech>) -> TestDevice {
    let sink = Arc::new(RecordingSink::default());
    let fallback = Arc::new(RecordingFallback::default());

    let sim = DeviceSimulator::new(
        Backends {
            phrases: phrases.clone(),
            speech: speech.clone(),
            sink: sink.clone(),
            fallback: fallback.clone(),
        },
        &RouterConfig::default(),
        &SpeechConfig::default(),
    );

    TestDevice {
        sim,
        phrases,
        speech,
        sink,
        fallback,
    }
}
