//! CaptionCut Core Engine
//!
//! Media-to-caption pipeline: extracts the audio track from an uploaded
//! media file, re-encodes it as canonical PCM WAV, submits it to the Gemini
//! transcription service, and turns the returned SRT text into an editable,
//! time-indexed caption timeline that can be re-exported as SRT.
//!
//! The crate is headless by design: playback, rendering, and any UI shell
//! live in consumers. They drive a [`pipeline::Pipeline`] and read the
//! resulting [`captions::CaptionTimeline`].

pub mod audio;
pub mod captions;
pub mod media;
pub mod pipeline;
pub mod transcribe;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
