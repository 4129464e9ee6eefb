//! Raw PCM payload decoding

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::cloud::SpeechPayload;
use crate::{Error, Result};

/// Sample rate of generated speech unless the payload declares otherwise
pub const PCM_SAMPLE_RATE: u32 = 24_000;

/// Generated speech is mono
pub const PCM_CHANNELS: u16 = 1;

/// Divisor mapping i16 samples onto [-1.0, 1.0]
const I16_SCALE: f32 = 32768.0;

/// Decoded, playable audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Wrap interleaved samples
    #[must_use]
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Interleaved samples in [-1.0, 1.0]
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the buffer, returning its samples
    #[must_use]
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Samples per second per channel
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Whether there is nothing to play
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = u64::try_from(self.frames()).unwrap_or(u64::MAX);
        Duration::from_millis(frames.saturating_mul(1000) / u64::from(self.sample_rate))
    }
}

/// Decode base64 text into raw bytes
///
/// # Errors
///
/// Returns error if the text is not valid base64
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Reinterpret little-endian bytes as 16-bit signed samples
///
/// A trailing odd byte is ignored.
#[must_use]
pub fn bytes_to_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Normalize samples to [-1.0, 1.0] by dividing by 32768
#[must_use]
pub fn normalize(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| f32::from(s) / I16_SCALE).collect()
}

/// Sample rate declared by a MIME type such as `audio/L16;codec=pcm;rate=24000`
#[must_use]
pub fn sample_rate_from_mime(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .filter(|&rate| rate > 0)
}

/// Decode a speech payload into a playable buffer
///
/// # Errors
///
/// Returns error if the payload is not base64 or holds no complete sample
pub fn decode_payload(payload: &SpeechPayload) -> Result<AudioBuffer> {
    let bytes = decode_base64(&payload.data)?;
    let samples = bytes_to_i16(&bytes);
    if samples.is_empty() {
        return Err(Error::Decode("audio payload holds no samples".to_string()));
    }

    let sample_rate = payload
        .mime_type
        .as_deref()
        .and_then(sample_rate_from_mime)
        .unwrap_or(PCM_SAMPLE_RATE);

    tracing::trace!(
        bytes = bytes.len(),
        samples = samples.len(),
        sample_rate,
        "decoded speech payload"
    );

    Ok(AudioBuffer::new(normalize(&samples), sample_rate, PCM_CHANNELS))
}

/// Encode a buffer as 16-bit WAV
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn buffer_to_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in buffer.samples() {
            // Inverse of `normalize`
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * I16_SCALE).round().clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
