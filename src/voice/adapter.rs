//! Speech playback adapter
//!
//! Converts a phrase into audible output: remote speech generation, PCM
//! decoding and device playback, with the local synthesizer as terminal
//! fallback. At most one playback session is active at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::fallback::FallbackSpeaker;
use super::pcm::{AudioBuffer, decode_payload};
use super::playback::AudioSink;
use crate::Result;
use crate::cloud::SpeechGenerator;

/// Visual state of the speech indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Ready for a new phrase
    #[default]
    Idle,
    /// Remote speech requested
    Loading,
    /// Audio started
    Playing,
    /// Remote speech failed, local synthesizer used
    Error,
}

impl PlaybackState {
    /// Whether a session currently holds the playback slot
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Playing)
    }
}

/// What happened to a speak request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Another session is active, or the text was blank
    Rejected,
    /// Remote audio is playing
    Remote,
    /// Remote speech failed; the local synthesizer was invoked
    Fallback,
}

/// Single-flight phrase speaker
pub struct SpeechAdapter {
    speech: Arc<dyn SpeechGenerator>,
    sink: Arc<dyn AudioSink>,
    fallback: Arc<dyn FallbackSpeaker>,
    slot: Arc<Slot>,
    playing: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SpeechAdapter {
    /// Create an adapter
    #[must_use]
    pub fn new(
        speech: Arc<dyn SpeechGenerator>,
        sink: Arc<dyn AudioSink>,
        fallback: Arc<dyn FallbackSpeaker>,
        reset_delay: Duration,
    ) -> Self {
        let (state, _rx) = watch::channel(PlaybackState::Idle);
        Self {
            speech,
            sink,
            fallback,
            slot: Arc::new(Slot {
                session: AtomicU64::new(0),
                state,
                reset_delay,
            }),
            playing: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        *self.slot.state.borrow()
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.slot.state.subscribe()
    }

    /// Speak `text`
    ///
    /// Rejected without side effects while another session is Loading or
    /// Playing. Never returns an error: remote failures are handed to the
    /// local synthesizer and reported as [`SpeakOutcome::Fallback`].
    ///
    /// Once the slot is claimed the session runs on its own task, so
    /// dropping the returned future does not leave the slot in Loading.
    pub async fn speak(&self, text: &str) -> SpeakOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SpeakOutcome::Rejected;
        }

        let Some(id) = self.slot.try_begin() else {
            tracing::debug!(text, "playback busy, request ignored");
            return SpeakOutcome::Rejected;
        };

        tracing::debug!(session = id, text, "speaking");

        let session = Session {
            id,
            text: text.to_string(),
            speech: Arc::clone(&self.speech),
            sink: Arc::clone(&self.sink),
            fallback: Arc::clone(&self.fallback),
            slot: Arc::clone(&self.slot),
            playing: Arc::clone(&self.playing),
        };

        match tokio::spawn(session.run()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(session = id, error = %e, "speech session aborted");
                self.slot.transition(id, PlaybackState::Error);
                Slot::schedule_reset(&self.slot, id);
                SpeakOutcome::Fallback
            }
        }
    }

    /// Wait for started audio to finish and the indicator to return to Idle
    pub async fn finish(&self) {
        let handles: Vec<_> = {
            let mut playing = self.playing.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *playing)
        };

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "playback task failed");
            }
        }

        let mut rx = self.slot.state.subscribe();
        if let Err(e) = rx.wait_for(|s| *s == PlaybackState::Idle).await {
            tracing::warn!(error = %e, "playback state closed before reaching idle");
        }
    }
}

/// The single playback slot and its indicator
struct Slot {
    session: AtomicU64,
    state: watch::Sender<PlaybackState>,
    reset_delay: Duration,
}

impl Slot {
    /// Claim the slot; check and set happen under one lock
    fn try_begin(&self) -> Option<u64> {
        let mut claimed = None;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            *state = PlaybackState::Loading;
            claimed = Some(self.session.fetch_add(1, Ordering::SeqCst) + 1);
            true
        });
        claimed
    }

    /// Move `session` to `next` unless a newer session owns the slot
    fn transition(&self, session: u64, next: PlaybackState) {
        self.state.send_if_modified(|state| {
            if self.session.load(Ordering::SeqCst) != session {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Revert Playing/Error to Idle after the reset delay
    ///
    /// Independent of audio duration; only reverts the scheduling session.
    fn schedule_reset(slot: &Arc<Self>, session: u64) {
        let slot = Arc::clone(slot);

        tokio::spawn(async move {
            tokio::time::sleep(slot.reset_delay).await;
            slot.state.send_if_modified(|s| {
                if slot.session.load(Ordering::SeqCst) != session
                    || !matches!(*s, PlaybackState::Playing | PlaybackState::Error)
                {
                    return false;
                }
                *s = PlaybackState::Idle;
                true
            });
        });
    }
}

/// One claimed playback session
struct Session {
    id: u64,
    text: String,
    speech: Arc<dyn SpeechGenerator>,
    sink: Arc<dyn AudioSink>,
    fallback: Arc<dyn FallbackSpeaker>,
    slot: Arc<Slot>,
    playing: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Session {
    async fn run(self) -> SpeakOutcome {
        let outcome = match self.fetch().await {
            Ok(buffer) => {
                self.slot.transition(self.id, PlaybackState::Playing);
                self.start_playback(buffer);
                SpeakOutcome::Remote
            }
            Err(e) => {
                tracing::warn!(session = self.id, error = %e, "remote speech failed, using local synthesizer");
                self.fallback.speak(&self.text);
                self.slot.transition(self.id, PlaybackState::Error);
                SpeakOutcome::Fallback
            }
        };

        Slot::schedule_reset(&self.slot, self.id);
        outcome
    }

    async fn fetch(&self) -> Result<AudioBuffer> {
        let payload = self.speech.generate_speech(&self.text).await?;
        decode_payload(&payload)
    }

    fn start_playback(&self, buffer: AudioBuffer) {
        let sink = Arc::clone(&self.sink);
        let fallback = Arc::clone(&self.fallback);
        let text = self.text.clone();

        let handle = tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.play(&buffer) {
                tracing::warn!(error = %e, "audio output failed, using local synthesizer");
                fallback.speak(&text);
            }
        });

        let mut playing = self.playing.lock().unwrap_or_else(|e| e.into_inner());
        playing.retain(|h| !h.is_finished());
        playing.push(handle);
    }
}
