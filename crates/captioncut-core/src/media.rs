//! Uploaded Media Intake
//!
//! In-memory model of a single uploaded media file plus the pre-flight
//! size gate. The gate runs before any decode resource is touched.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Maximum accepted upload size: 50 MB, checked before any decode attempt
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

// =============================================================================
// Uploaded Media
// =============================================================================

/// A single media file handed to the pipeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    /// Original file name, extension included (e.g. "talk.mp4")
    pub file_name: String,
    /// Declared MIME type (e.g. "video/mp4", "audio/mpeg")
    pub mime_type: String,
    /// Raw file contents
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl UploadedMedia {
    /// Creates a new uploaded media descriptor
    pub fn new(file_name: &str, mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            data,
        }
    }

    /// Returns the payload size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns the payload size in megabytes
    pub fn size_mb(&self) -> f64 {
        self.size_bytes() as f64 / (1024.0 * 1024.0)
    }

    /// Returns true if the declared MIME type is an audio type
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// Returns true if the declared MIME type is a video type
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Returns the file name with its last extension removed
    pub fn file_stem(&self) -> &str {
        match self.file_name.rfind('.') {
            Some(idx) if idx > 0 => &self.file_name[..idx],
            _ => &self.file_name,
        }
    }

    /// Rejects uploads over [`MAX_UPLOAD_BYTES`].
    ///
    /// The error message carries the observed size in megabytes to one
    /// decimal place.
    pub fn check_size(&self) -> CoreResult<()> {
        if self.size_bytes() > MAX_UPLOAD_BYTES {
            return Err(CoreError::FileTooLarge {
                size_mb: self.size_mb(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn media_of_size(bytes: usize) -> UploadedMedia {
        UploadedMedia::new("clip.mp4", "video/mp4", vec![0u8; bytes])
    }

    #[test]
    fn test_size_gate_accepts_at_limit() {
        let media = media_of_size(MAX_UPLOAD_BYTES as usize);
        assert!(media.check_size().is_ok());
    }

    #[test]
    fn test_size_gate_rejects_over_limit() {
        let media = media_of_size(60 * 1024 * 1024);
        let err = media.check_size().unwrap_err();

        assert!(matches!(err, CoreError::FileTooLarge { .. }));
        assert!(err.to_string().contains("(60.0MB)"));
    }

    #[test]
    fn test_mime_type_predicates() {
        let video = UploadedMedia::new("a.mp4", "video/mp4", vec![]);
        assert!(video.is_video());
        assert!(!video.is_audio());

        let audio = UploadedMedia::new("a.mp3", "audio/mpeg", vec![]);
        assert!(audio.is_audio());
        assert!(!audio.is_video());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(media_of_size(0).file_stem(), "clip");

        let dotted = UploadedMedia::new("my.talk.final.mov", "video/quicktime", vec![]);
        assert_eq!(dotted.file_stem(), "my.talk.final");

        let bare = UploadedMedia::new("recording", "audio/wav", vec![]);
        assert_eq!(bare.file_stem(), "recording");

        let hidden = UploadedMedia::new(".hidden", "audio/wav", vec![]);
        assert_eq!(hidden.file_stem(), ".hidden");
    }

    #[test]
    fn test_size_mb() {
        let media = media_of_size(40 * 1024 * 1024);
        assert_eq!(media.size_mb(), 40.0);
    }
}
