//! Transcription Module
//!
//! Turns an encoded audio payload into SRT text via a transcription
//! service. The service seam is the [`Transcriber`] trait; the shipped
//! implementation is the Gemini client in `gemini.rs`.

mod gemini;

pub use gemini::{GeminiConfig, GeminiTranscriber};

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::EncodedAudio;
use crate::{CoreError, CoreResult};

// =============================================================================
// Caption Style
// =============================================================================

/// Caption pacing preset.
///
/// Selects the style instruction embedded in the transcription prompt;
/// the service does the actual line chunking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionStyle {
    /// Short punchy lines for vertical video
    #[default]
    Reels,
    /// Traditional subtitle pacing
    Standard,
    /// Rapid-fire captions for high-energy speech
    Fast,
}

impl CaptionStyle {
    /// All selectable styles, in presentation order
    pub const ALL: &'static [CaptionStyle] =
        &[CaptionStyle::Reels, CaptionStyle::Standard, CaptionStyle::Fast];

    /// Stable identifier used on the CLI and in serialized form
    pub fn id(&self) -> &'static str {
        match self {
            CaptionStyle::Reels => "reels",
            CaptionStyle::Standard => "standard",
            CaptionStyle::Fast => "fast",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            CaptionStyle::Reels => "Reels / TikTok",
            CaptionStyle::Standard => "Standard subtitles",
            CaptionStyle::Fast => "Fast-paced",
        }
    }

    /// Style instruction spliced into the transcription prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            CaptionStyle::Reels => {
                "Break sentences into chunks of exactly 2-4 words. Each line should be punchy for TikTok/Reels."
            }
            CaptionStyle::Standard => {
                "Standard subtitle format. 5-8 words per line. Traditional pacing."
            }
            CaptionStyle::Fast => {
                "Rapid-fire captions, 2-5 words. Optimized for high-energy speech."
            }
        }
    }
}

impl FromStr for CaptionStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reels" => Ok(CaptionStyle::Reels),
            "standard" => Ok(CaptionStyle::Standard),
            "fast" => Ok(CaptionStyle::Fast),
            other => Err(CoreError::Unknown(format!(
                "unknown caption style: {other}"
            ))),
        }
    }
}

/// Builds the full transcription prompt for a style.
pub fn build_prompt(style: CaptionStyle) -> String {
    format!(
        "Transcribe this audio into a professional SRT file.\nRULES:\n1. Style: {}\n2. Maintain frame-accurate sync.\n3. Return valid SRT content only.",
        style.instruction()
    )
}

// =============================================================================
// Transcriber Trait
// =============================================================================

/// A service that transcribes encoded audio into SRT text.
///
/// Implementations return the raw service output; tolerant SRT parsing
/// happens downstream.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribes the audio payload using the given style preset
    async fn transcribe(&self, audio: &EncodedAudio, style: CaptionStyle) -> CoreResult<String>;
}

// =============================================================================
// Tests
// =============================================================================
