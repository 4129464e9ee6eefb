//! QuickSpeak - AAC device simulator
//!
//! This library provides the core of a simulated augmentative and
//! alternative communication device:
//! - Phrase grid with scenario-specific context packs
//! - Suggestion routing between an on-device keyword table and a remote model
//! - Speech playback with an on-device synthesizer as fallback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Device Simulator                   │
//! │     Phrase Grid  │  Query Box  │  Speech Indicator  │
//! └──────────┬───────────────┬────────────────┬─────────┘
//!            │               │                │
//! ┌──────────▼─────┐ ┌───────▼────────┐ ┌─────▼──────────┐
//! │ Context Packs  │ │ Suggestion     │ │ Speech         │
//! │                │ │ Router         │ │ Adapter        │
//! └──────────┬─────┘ └───────┬────────┘ └─────┬──────────┘
//!            │               │                │
//! ┌──────────▼───────────────▼────────────────▼─────────┐
//! │      Remote Model (phrases, speech)  │  Audio Out   │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod cloud;
pub mod config;
pub mod error;
pub mod packs;
pub mod phrases;
pub mod router;
pub mod simulator;
pub mod voice;

pub use cloud::{GeminiClient, PhraseGenerator, SpeechGenerator, SpeechPayload};
pub use config::Config;
pub use error::{Error, Result};
pub use packs::ContextPackGenerator;
pub use phrases::{ContextPack, PhraseSet};
pub use router::{Route, SuggestionController, SuggestionRouter, SuggestionState, Suggestions};
pub use simulator::{Backends, DeviceSimulator, DeviceSnapshot, GridState};
pub use voice::{
    AudioBuffer, AudioPlayback, AudioSink, FallbackSpeaker, LocalSynthesizer, PlaybackState,
    SpeakOutcome, SpeechAdapter,
};
