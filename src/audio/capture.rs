//! Audio capture from microphone
//!
//! The hardware callback chops incoming samples into fixed-size frames and
//! pushes them onto an unbounded channel. The producer never blocks; a slow
//! consumer means frames accumulate without bound, so the listener must
//! drain promptly.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use tokio::sync::mpsc;

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16_000;

/// Samples per emitted frame (32ms at 16kHz)
pub const FRAME_LEN: usize = 512;

/// Captures fixed-size audio frames from the default input device
pub struct AudioCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    tx: mpsc::UnboundedSender<Vec<f32>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance and the frame channel it feeds
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<Vec<f32>>)> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            frame_len = FRAME_LEN,
            "audio capture initialized"
        );

        let (tx, rx) = mpsc::unbounded_channel();

        Ok((
            Self {
                device,
                config,
                tx,
                stream: None,
            },
            rx,
        ))
    }

    /// Start emitting frames
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let tx = self.tx.clone();
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let config = self.config.clone();
        let mut pending: Vec<f32> = Vec::with_capacity(FRAME_LEN * 2);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    pending.extend_from_slice(data);
                    while pending.len() >= FRAME_LEN {
                        let frame: Vec<f32> = pending.drain(..FRAME_LEN).collect();
                        // Unbounded send never blocks the hardware callback
                        let _ = tx.send(frame);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Get the sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// Mean absolute amplitude of a sample buffer
///
/// Cheap loudness measure used to gate wake checks and reject too-quiet
/// command captures before any transcription happens.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_abs_amplitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_abs_amplitude() {
        assert!(mean_abs_amplitude(&[]) < f32::EPSILON);
        assert!(mean_abs_amplitude(&vec![0.0; 64]) < 0.0001);

        let loud = vec![0.5f32; 64];
        assert!((mean_abs_amplitude(&loud) - 0.5).abs() < 0.0001);

        let mixed = [-0.25f32, 0.25, -0.25, 0.25];
        assert!((mean_abs_amplitude(&mixed) - 0.25).abs() < 0.0001);
    }

    #[test]
    fn test_samples_to_wav_header() {
        let samples = vec![0.1f32; 256];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert!(wav.len() > 44);
    }
}
