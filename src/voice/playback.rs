//! Audio playback to speakers

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use super::pcm::AudioBuffer;
use crate::{Error, Result};

/// Somewhere decoded audio can be played
///
/// `play` blocks until the buffer has been rendered; callers run it on a
/// blocking thread.
pub trait AudioSink: Send + Sync {
    /// Play `buffer` to completion
    ///
    /// # Errors
    ///
    /// Returns error if the output cannot be opened or the stream fails
    fn play(&self, buffer: &AudioBuffer) -> Result<()>;
}

/// Plays audio to the default output device
///
/// The device is resolved again for every buffer, so a machine without an
/// output device still gets a sink; its `play` calls fail with
/// [`Error::Audio`] and callers fall back.
#[derive(Debug, Default)]
pub struct AudioPlayback {
    device_name: Option<String>,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    #[must_use]
    pub fn new() -> Self {
        match default_device() {
            Ok(device) => {
                let device_name = device.name().unwrap_or_default();
                tracing::debug!(device = %device_name, "audio playback initialized");
                Self {
                    device_name: Some(device_name),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "no audio output, speech will use the local synthesizer");
                Self::default()
            }
        }
    }

    /// Name of the output device found at startup
    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    /// Play samples in a blocking manner
    fn play_blocking(&self, buffer: &AudioBuffer) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let device = default_device()?;
        let config = output_config(&device, buffer.sample_rate(), buffer.channels())?;
        let out_channels = usize::from(config.channels);
        let in_channels = usize::from(buffer.channels());

        let samples: Arc<Vec<f32>> = Arc::new(buffer.samples().to_vec());
        let frames = buffer.frames();
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let samples_cb = Arc::clone(&samples);
        let position_cb = Arc::clone(&position);
        let finished_cb = Arc::clone(&finished);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut frame_idx = position_cb.load(Ordering::Relaxed);

                    for out in data.chunks_mut(out_channels) {
                        if frame_idx < frames {
                            let base = frame_idx * in_channels;
                            for (ch, sample) in out.iter_mut().enumerate() {
                                // Duplicate the last input channel into extra outputs
                                *sample = samples_cb[base + ch.min(in_channels - 1)];
                            }
                            frame_idx += 1;
                        } else {
                            finished_cb.store(true, Ordering::Release);
                            out.fill(0.0);
                        }
                    }

                    position_cb.store(frame_idx, Ordering::Relaxed);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Poll for completion with timeout
        let start = Instant::now();
        let timeout = buffer.duration() + Duration::from_millis(500);

        while !finished.load(Ordering::Acquire) {
            if start.elapsed() > timeout {
                tracing::warn!("playback did not report completion, stopping");
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        // Let the device drain its last period
        std::thread::sleep(Duration::from_millis(100));

        drop(stream);
        tracing::debug!(
            frames,
            sample_rate = buffer.sample_rate(),
            channels = out_channels,
            "playback complete"
        );

        Ok(())
    }
}

impl AudioSink for AudioPlayback {
    fn play(&self, buffer: &AudioBuffer) -> Result<()> {
        self.play_blocking(buffer)
    }
}

fn default_device() -> Result<Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))
}

/// Pick an output config at `sample_rate`, preferring `channels`, then stereo
fn output_config(device: &Device, sample_rate: u32, channels: u16) -> Result<StreamConfig> {
    let rate = SampleRate(sample_rate);
    let supports = |c: &cpal::SupportedStreamConfigRange, ch: u16| {
        c.channels() == ch && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
    };

    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| supports(c, channels))
        .or_else(|| {
            // Fallback: try stereo
            device
                .supported_output_configs()
                .ok()?
                .find(|c| supports(c, 2))
        })
        .ok_or_else(|| {
            Error::Audio(format!(
                "no output config for {channels} channel(s) at {sample_rate} Hz"
            ))
        })?;

    Ok(supported.with_sample_rate(rate).config())
}
