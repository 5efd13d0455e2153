//! CaptionCut Error Definitions
//!
//! Defines error types used throughout the engine. Every pipeline failure
//! is recovered at the orchestrator boundary and converted into the
//! `Error` process state with a user-facing message; nothing here is
//! expected to propagate past the pipeline.

use thiserror::Error;

use super::CaptionId;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Intake Errors
    // =========================================================================
    #[error("File is too large ({size_mb:.1}MB). Limit is 50MB.")]
    FileTooLarge { size_mb: f64 },

    // =========================================================================
    // Extraction Errors
    // =========================================================================
    #[error("Unable to extract audio track. Ensure the file is not corrupted.")]
    UnsupportedMedia,

    #[error("Audio decode failed: {0}")]
    DecodeFailed(String),

    #[error("Invalid audio buffer: {0}")]
    InvalidAudioBuffer(String),

    // =========================================================================
    // Transcription Errors
    // =========================================================================
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    // =========================================================================
    // Caption Errors
    // =========================================================================
    #[error("Caption not found: {0}")]
    CaptionNotFound(CaptionId),

    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Interrupted: {0}")]
    Unknown(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Message suitable for direct display to the user.
    ///
    /// Currently the `Display` rendering; kept as a separate seam so
    /// consumer-facing wording can diverge from log wording later.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_message_one_decimal() {
        let err = CoreError::FileTooLarge { size_mb: 60.0 };
        assert_eq!(
            err.to_string(),
            "File is too large (60.0MB). Limit is 50MB."
        );

        let err = CoreError::FileTooLarge { size_mb: 51.26 };
        assert!(err.to_string().contains("(51.3MB)"));
    }

    #[test]
    fn test_user_message_matches_display() {
        let err = CoreError::TranscriptionFailed("connection reset".to_string());
        assert_eq!(err.user_message(), err.to_string());
    }
}
