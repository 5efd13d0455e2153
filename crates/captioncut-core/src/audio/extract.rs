//! Audio Extraction
//!
//! Turns an uploaded media file into the payload submitted for
//! transcription: decode the container's audio track into an
//! [`AudioBuffer`] and re-encode it as canonical WAV, or, when decoding
//! fails but the upload already declares an audio type, pass the original
//! bytes through unchanged.
//!
//! Decoding happens inside a [`DecodeSession`], a scoped scratch workspace
//! that is released on every exit path. There is no ambient decode state.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tempfile::TempDir;

use super::{encode_wav, AudioBuffer, EncodedAudio};
use crate::media::UploadedMedia;
use crate::{CoreError, CoreResult};

// =============================================================================
// Decode Session
// =============================================================================

/// Scoped workspace for one decode attempt.
///
/// Acquired at the start of an extraction call and released at its end,
/// success or failure. Releasing twice is a no-op, and `Drop` releases any
/// session that was not released explicitly.
#[derive(Debug)]
pub struct DecodeSession {
    dir: Option<TempDir>,
}

impl DecodeSession {
    /// Acquires a fresh scratch directory
    pub fn acquire() -> CoreResult<Self> {
        Ok(Self {
            dir: Some(tempfile::tempdir()?),
        })
    }

    /// Path of the scratch directory; fails if the session was released
    pub fn scratch_dir(&self) -> CoreResult<&Path> {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| CoreError::DecodeFailed("decode session already released".to_string()))
    }

    /// Releases the scratch directory. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(err) = dir.close() {
                tracing::warn!("failed to remove decode scratch directory: {err}");
            }
        }
    }

    /// Returns true once the workspace has been released
    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        self.release();
    }
}

// =============================================================================
// Media Decoder
// =============================================================================

/// Decode capability seam.
///
/// Implementations turn raw container bytes into a decoded [`AudioBuffer`]
/// at the container's native sample rate and channel layout, using the
/// session's scratch directory for any intermediate files.
pub trait MediaDecoder: Send + Sync {
    /// Decodes the audio track of an arbitrary media container
    fn decode(&self, session: &DecodeSession, data: &[u8]) -> CoreResult<AudioBuffer>;
}

/// FFmpeg-backed decoder.
///
/// Shells out to `ffmpeg` to decode the first audio stream into a float
/// WAV inside the session workspace, then reads it back with `hound`.
pub struct FfmpegDecoder {
    ffmpeg_path: String,
}

impl FfmpegDecoder {
    /// Creates a decoder using `ffmpeg` from `PATH`
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    /// Creates a decoder using an explicit ffmpeg binary
    pub fn with_path(ffmpeg_path: &str) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.to_string(),
        }
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDecoder for FfmpegDecoder {
    fn decode(&self, session: &DecodeSession, data: &[u8]) -> CoreResult<AudioBuffer> {
        let scratch = session.scratch_dir()?;
        let input_path: PathBuf = scratch.join("input.bin");
        let output_path: PathBuf = scratch.join("decoded.wav");

        std::fs::write(&input_path, data)?;

        let output = Command::new(&self.ffmpeg_path)
            .args([
                "-i",
                input_path.to_str().unwrap_or_default(),
                "-vn", // drop any video stream
                "-c:a",
                "pcm_f32le", // float samples, native rate and channel count
                "-f",
                "wav",
                "-y",
                output_path.to_str().unwrap_or_default(),
            ])
            .output()
            .map_err(|e| CoreError::DecodeFailed(format!("failed to run ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::DecodeFailed(
                stderr.lines().last().unwrap_or("ffmpeg failed").to_string(),
            ));
        }

        read_wav_buffer(&output_path)
    }
}

/// Reads a decoded WAV file into a non-interleaved [`AudioBuffer`].
fn read_wav_buffer(path: &Path) -> CoreResult<AudioBuffer> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| CoreError::DecodeFailed(format!("failed to open decoded WAV: {e}")))?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| CoreError::DecodeFailed(format!("failed to read samples: {e}")))?,
        (hound::SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<_, _>>()
            .map_err(|e| CoreError::DecodeFailed(format!("failed to read samples: {e}")))?,
        (format, bits) => {
            return Err(CoreError::DecodeFailed(format!(
                "unsupported decoded sample format: {format:?}/{bits}-bit"
            )));
        }
    };

    if channel_count == 0 || interleaved.len() % channel_count != 0 {
        return Err(CoreError::DecodeFailed(
            "decoded sample count does not match channel layout".to_string(),
        ));
    }

    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    AudioBuffer::new(spec.sample_rate, channels)
}

// =============================================================================
// Extraction
// =============================================================================

/// Extracts the transcription payload from an uploaded media file.
///
/// On a successful decode the buffer is re-encoded as canonical WAV. If
/// decoding fails and the upload declares an audio MIME type, the original
/// bytes are passed through unchanged; otherwise the media is unsupported.
pub fn extract_audio(
    media: &UploadedMedia,
    decoder: &dyn MediaDecoder,
) -> CoreResult<EncodedAudio> {
    let mut session = DecodeSession::acquire()?;
    let outcome = match decoder.decode(&session, &media.data) {
        Ok(buffer) => {
            tracing::debug!(
                "decoded {} channel(s) at {} Hz, {:.2}s",
                buffer.channel_count(),
                buffer.sample_rate(),
                buffer.duration(),
            );
            Ok(encode_wav(&buffer))
        }
        Err(err) if media.is_audio() => {
            tracing::debug!("decode failed ({err}); passing declared audio payload through");
            Ok(EncodedAudio::new(media.data.clone(), &media.mime_type))
        }
        Err(err) => {
            tracing::warn!("audio extraction failed for {}: {err}", media.file_name);
            Err(CoreError::UnsupportedMedia)
        }
    };
    session.release();
    outcome
}

/// Extracts audio off the async runtime via `spawn_blocking`.
pub async fn extract_audio_async(
    media: UploadedMedia,
    decoder: Arc<dyn MediaDecoder>,
) -> CoreResult<EncodedAudio> {
    tokio::task::spawn_blocking(move || extract_audio(&media, decoder.as_ref()))
        .await
        .map_err(|e| CoreError::Unknown(e.to_string()))?
}

// =============================================================================
// Tests
// =============================================================================
