//! Speech output
//!
//! Decodes generated speech, plays it on the output device and falls back to
//! the platform synthesizer when remote speech is unavailable.

mod adapter;
mod fallback;
mod pcm;
mod playback;

pub use adapter::{PlaybackState, SpeakOutcome, SpeechAdapter};
pub use fallback::{FallbackSpeaker, LocalSynthesizer};
pub use pcm::{
    AudioBuffer, PCM_CHANNELS, PCM_SAMPLE_RATE, buffer_to_wav, bytes_to_i16, decode_base64,
    decode_payload, normalize, sample_rate_from_mime,
};
pub use playback::{AudioPlayback, AudioSink};
