//! Device simulator
//!
//! Owns the observable state of the simulated device (phrase grid, query
//! suggestions, speech indicator) and exposes the user actions as transition
//! methods. State is published through watch channels; nothing outside the
//! simulator mutates it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;

use crate::cloud::{GeminiClient, PhraseGenerator, SpeechGenerator};
use crate::config::{Config, RouterConfig, SpeechConfig};
use crate::packs::ContextPackGenerator;
use crate::phrases::ContextPack;
use crate::router::{SuggestionController, SuggestionRouter, SuggestionState};
use crate::voice::{
    AudioPlayback, AudioSink, FallbackSpeaker, LocalSynthesizer, PlaybackState, SpeakOutcome,
    SpeechAdapter,
};

/// Phrase grid state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridState {
    /// Pack currently shown
    pub pack: ContextPack,
    /// A context pack is being generated
    pub generating: bool,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            pack: ContextPack::startup(),
            generating: false,
        }
    }
}

/// Point-in-time view of the whole device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    /// Phrase grid
    pub grid: GridState,
    /// Query suggestions
    pub suggestions: SuggestionState,
    /// Speech indicator
    pub playback: PlaybackState,
}

/// Services the simulator is wired to
pub struct Backends {
    /// Suggestions and context packs
    pub phrases: Arc<dyn PhraseGenerator>,
    /// Remote speech
    pub speech: Arc<dyn SpeechGenerator>,
    /// Audio output
    pub sink: Arc<dyn AudioSink>,
    /// Local synthesizer used when remote speech or output fails
    pub fallback: Arc<dyn FallbackSpeaker>,
}

impl Backends {
    /// Remote client, default output device and platform synthesizer
    ///
    /// A missing output device is not fatal: playback then fails per phrase
    /// and the platform synthesizer speaks instead.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let client = Arc::new(GeminiClient::new(&config.api, &config.speech.voice));

        let playback = AudioPlayback::new();
        if let Some(device) = playback.device_name() {
            tracing::info!(device, "audio output ready");
        }

        Self {
            phrases: client.clone(),
            speech: client,
            sink: Arc::new(playback),
            fallback: Arc::new(LocalSynthesizer::from_config(
                config.speech.fallback_command.as_deref(),
            )),
        }
    }
}

/// Simulated AAC device
pub struct DeviceSimulator {
    grid: watch::Sender<GridState>,
    pack_seq: AtomicU64,
    packs: ContextPackGenerator,
    suggestions: SuggestionController,
    speech: SpeechAdapter,
}

impl DeviceSimulator {
    /// Build a simulator over the given services
    #[must_use]
    pub fn new(backends: Backends, router: &RouterConfig, speech: &SpeechConfig) -> Self {
        let (grid, _rx) = watch::channel(GridState::default());
        let suggestion_router = Arc::new(SuggestionRouter::new(Arc::clone(&backends.phrases)));

        Self {
            grid,
            pack_seq: AtomicU64::new(0),
            packs: ContextPackGenerator::new(backends.phrases),
            suggestions: SuggestionController::new(suggestion_router, router.debounce),
            speech: SpeechAdapter::new(
                backends.speech,
                backends.sink,
                backends.fallback,
                speech.reset_delay,
            ),
        }
    }

    /// Build a simulator talking to the configured remote service
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(Backends::from_config(config), &config.router, &config.speech)
    }

    /// Replace the grid with a pack generated for `scenario`
    ///
    /// A blank scenario is ignored and returns `None`. When packs are
    /// requested concurrently only the newest one is shown.
    pub async fn push_context_pack(&self, scenario: &str) -> Option<ContextPack> {
        if scenario.trim().is_empty() {
            return None;
        }

        let seq = self.pack_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.grid.send_modify(|g| g.generating = true);

        let Some(pack) = self.packs.generate(scenario).await else {
            self.grid.send_modify(|g| g.generating = false);
            return None;
        };

        let applied = self.grid.send_if_modified(|g| {
            if self.pack_seq.load(Ordering::SeqCst) != seq {
                return false;
            }
            g.pack = pack.clone();
            g.generating = false;
            true
        });
        if !applied {
            tracing::debug!(scenario, "newer context pack requested, result discarded");
        }

        Some(pack)
    }

    /// Type into the query box; returns the input's sequence token
    pub fn type_query(&self, text: &str) -> u64 {
        self.suggestions.input(text)
    }

    /// Speak the grid phrase at `index`; `None` when out of range
    pub async fn speak_grid(&self, index: usize) -> Option<SpeakOutcome> {
        let phrase = self.grid.borrow().pack.phrases.get(index).map(str::to_string)?;
        Some(self.speech.speak(&phrase).await)
    }

    /// Speak the suggestion at `index`; `None` when out of range
    pub async fn speak_suggestion(&self, index: usize) -> Option<SpeakOutcome> {
        let phrase = self.suggestions.current().suggestions.get(index).map(str::to_string)?;
        Some(self.speech.speak(&phrase).await)
    }

    /// Speak arbitrary text
    pub async fn speak(&self, text: &str) -> SpeakOutcome {
        self.speech.speak(text).await
    }

    /// Current state of the whole device
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            grid: self.grid.borrow().clone(),
            suggestions: self.suggestions.current(),
            playback: self.speech.state(),
        }
    }

    /// Subscribe to grid changes
    #[must_use]
    pub fn subscribe_grid(&self) -> watch::Receiver<GridState> {
        self.grid.subscribe()
    }

    /// Subscribe to suggestion changes
    #[must_use]
    pub fn subscribe_suggestions(&self) -> watch::Receiver<SuggestionState> {
        self.suggestions.subscribe()
    }

    /// Subscribe to speech indicator changes
    #[must_use]
    pub fn subscribe_playback(&self) -> watch::Receiver<PlaybackState> {
        self.speech.subscribe()
    }

    /// Wait for pending query input to settle
    pub async fn suggestions_settled(&self) -> SuggestionState {
        self.suggestions.settled().await
    }

    /// Wait for started speech to finish and the indicator to return to Idle
    pub async fn speech_finished(&self) {
        self.speech.finish().await;
    }
}
