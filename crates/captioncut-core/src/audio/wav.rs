//! Canonical PCM WAV Encoder
//!
//! Encodes an [`AudioBuffer`] into a single canonical container: a 44-byte
//! RIFF/WAVE header followed by interleaved little-endian 16-bit signed
//! samples. The output is deterministic from the channel count, sample
//! rate, and frame count, and the encoder has no failure path.

use super::{AudioBuffer, EncodedAudio};

/// RIFF/WAVE header size in bytes
const HEADER_LEN: usize = 44;

/// Bytes per sample (PCM16)
const BYTES_PER_SAMPLE: usize = 2;

// =============================================================================
// Encoding
// =============================================================================

/// Encodes a decoded audio buffer as canonical PCM16 WAV.
///
/// Samples are clamped to [-1.0, 1.0] and scaled asymmetrically (negative
/// values by 32768, non-negative values by 32767) so the positive boundary
/// cannot overflow. Fractional results are truncated toward zero. Channels
/// are interleaved per frame.
///
/// Output length is exactly `44 + 2 * channels * frames`.
pub fn encode_wav(buffer: &AudioBuffer) -> EncodedAudio {
    let channels = buffer.channel_count();
    let frames = buffer.frame_count();
    let data_len = channels * frames * BYTES_PER_SAMPLE;
    let total_len = HEADER_LEN + data_len;

    let mut out = Vec::with_capacity(total_len);

    // RIFF chunk
    out.extend_from_slice(b"RIFF");
    push_u32_le(&mut out, (total_len - 8) as u32);
    out.extend_from_slice(b"WAVE");

    // fmt chunk: PCM, 16-bit
    out.extend_from_slice(b"fmt ");
    push_u32_le(&mut out, 16);
    push_u16_le(&mut out, 1); // audio format: PCM
    push_u16_le(&mut out, channels as u16);
    push_u32_le(&mut out, buffer.sample_rate());
    push_u32_le(
        &mut out,
        buffer.sample_rate() * (BYTES_PER_SAMPLE * channels) as u32,
    ); // byte rate
    push_u16_le(&mut out, (BYTES_PER_SAMPLE * channels) as u16); // block align
    push_u16_le(&mut out, 16); // bits per sample

    // data chunk
    out.extend_from_slice(b"data");
    push_u32_le(&mut out, data_len as u32);

    for frame in 0..frames {
        for channel in 0..channels {
            let sample = quantize(buffer.channel(channel)[frame]);
            push_u16_le(&mut out, sample as u16);
        }
    }

    EncodedAudio::new(out, "audio/wav")
}

/// Clamps a float sample and converts it to PCM16.
fn quantize(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    // `as` truncates toward zero; the clamp keeps the value in i16 range.
    scaled as i16
}

fn push_u16_le(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

// =============================================================================
// Tests
// =============================================================================
