//! Audio Processing Module
//!
//! Provides the audio side of the pipeline:
//! - In-memory decoded audio model ([`AudioBuffer`]) and the encoded
//!   payload handed to the transcription service ([`EncodedAudio`])
//! - Canonical PCM WAV encoding (`wav.rs`)
//! - Audio extraction with decode-or-passthrough semantics (`extract.rs`)

mod extract;
mod wav;

pub use extract::{
    extract_audio, extract_audio_async, DecodeSession, FfmpegDecoder, MediaDecoder,
};
pub use wav::encode_wav;

use crate::{CoreError, CoreResult};

// =============================================================================
// Audio Buffer
// =============================================================================

/// A decoded, non-interleaved audio buffer.
///
/// One `Vec<f32>` per channel, all the same length, samples nominally in
/// [-1.0, 1.0]. Length and channel count are fixed at construction; the
/// buffer is never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Creates a buffer from per-channel sample data.
    ///
    /// Requires at least one channel, a non-zero sample rate, and equal
    /// sample counts across channels.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> CoreResult<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidAudioBuffer(
                "sample rate must be non-zero".to_string(),
            ));
        }
        if channels.is_empty() {
            return Err(CoreError::InvalidAudioBuffer(
                "at least one channel is required".to_string(),
            ));
        }
        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(CoreError::InvalidAudioBuffer(
                "all channels must have the same length".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (>= 1)
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames per channel
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Sample data for one channel
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }
}

// =============================================================================
// Encoded Audio
// =============================================================================

/// Opaque encoded audio payload plus its format tag.
///
/// Produced once by the extractor and handed to the transcription client;
/// immutable and discarded after the service call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedAudio {
    /// Encoded bytes
    pub data: Vec<u8>,
    /// MIME type of `data` ("audio/wav" for encoded buffers, the declared
    /// type for pass-through audio)
    pub mime_type: String,
}

impl EncodedAudio {
    /// Creates a new encoded payload
    pub fn new(data: Vec<u8>, mime_type: &str) -> Self {
        Self {
            data,
            mime_type: mime_type.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_construction() {
        let buffer = AudioBuffer::new(44_100, vec![vec![0.0; 10], vec![0.0; 10]]).unwrap();

        assert_eq!(buffer.sample_rate(), 44_100);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 10);
    }

    #[test]
    fn test_buffer_rejects_zero_sample_rate() {
        let result = AudioBuffer::new(0, vec![vec![0.0; 10]]);
        assert!(matches!(
            result.unwrap_err(),
            CoreError::InvalidAudioBuffer(_)
        ));
    }

    #[test]
    fn test_buffer_rejects_no_channels() {
        let result = AudioBuffer::new(16_000, vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_buffer_rejects_uneven_channels() {
        let result = AudioBuffer::new(16_000, vec![vec![0.0; 10], vec![0.0; 9]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_buffer_duration() {
        let buffer = AudioBuffer::new(16_000, vec![vec![0.0; 8_000]]).unwrap();
        assert_eq!(buffer.duration(), 0.5);
    }
}
