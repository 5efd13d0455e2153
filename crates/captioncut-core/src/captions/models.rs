//! Caption Data Models
//!
//! Defines the caption entry and the timeline that owns a completed run's
//! caption list. The timeline resolves the active caption against an
//! externally owned playback clock and applies in-place text edits; it
//! never drives playback itself.

use serde::{Deserialize, Serialize};

use crate::{CaptionId, CoreError, CoreResult, TimeSec};

// =============================================================================
// Caption Entry
// =============================================================================

/// A single caption with its SRT timing.
///
/// Both the formatted timestrings and their float-second equivalents are
/// kept so export reproduces the service's timestamps byte for byte.
/// `start_sec < end_sec` holds for every caption produced by the parser.
/// Only `text` is mutable after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    /// SRT block sequence number
    pub id: CaptionId,
    /// Start timestamp, "HH:MM:SS,mmm"
    pub start_time: String,
    /// End timestamp, "HH:MM:SS,mmm"
    pub end_time: String,
    /// Start time in seconds
    pub start_sec: TimeSec,
    /// End time in seconds
    pub end_sec: TimeSec,
    /// Caption text, flattened to a single line
    pub text: String,
}

impl Caption {
    /// Returns the duration of this caption in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Returns true if the caption covers the given playback time.
    ///
    /// Both boundaries are inclusive; which caption wins on a shared
    /// boundary is decided by the timeline's first-match rule.
    pub fn covers(&self, time_sec: TimeSec) -> bool {
        time_sec >= self.start_sec && time_sec <= self.end_sec
    }
}

// =============================================================================
// Seek Target
// =============================================================================

/// Playback instruction produced by [`CaptionTimeline::seek_to`].
///
/// Pure data for the consumer to apply to its own playback clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekTarget {
    /// Position to seek to, in seconds
    pub time_sec: TimeSec,
    /// Whether playback should start after seeking
    pub play: bool,
}

// =============================================================================
// Caption Timeline
// =============================================================================

/// Owner of one completed run's ordered caption list.
///
/// Two states: empty (initial, and after [`discard`](Self::discard)) and
/// populated (after a successful parse). Captions are stored in service
/// output order and never re-sorted; overlapping intervals are tolerated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTimeline {
    captions: Vec<Caption>,
}

impl CaptionTimeline {
    /// Creates an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the caption list atomically with a parsed run result
    pub fn populate(&mut self, captions: Vec<Caption>) {
        self.captions = captions;
    }

    /// Clears the timeline back to the empty state. Idempotent.
    pub fn discard(&mut self) {
        self.captions.clear();
    }

    /// Returns true if no run result is loaded
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// Number of captions
    pub fn len(&self) -> usize {
        self.captions.len()
    }

    /// The captions in stored order
    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    /// Resolves the caption active at the given playback time.
    ///
    /// First caption in stored order whose interval covers `time_sec`
    /// (boundaries inclusive), a stable tie-break when intervals overlap
    /// or share a boundary. `None` on an empty timeline or in a gap.
    pub fn active_caption_at(&self, time_sec: TimeSec) -> Option<&Caption> {
        self.captions.iter().find(|c| c.covers(time_sec))
    }

    /// Replaces the text of the caption with the given id.
    ///
    /// Timing, id, and list order are untouched. When duplicate ids exist
    /// the first match is edited.
    pub fn edit_text(&mut self, id: CaptionId, new_text: &str) -> CoreResult<()> {
        let caption = self
            .captions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CoreError::CaptionNotFound(id))?;
        caption.text = new_text.to_string();
        Ok(())
    }

    /// Produces the seek instruction for jumping to a caption
    pub fn seek_to(&self, caption: &Caption) -> SeekTarget {
        SeekTarget {
            time_sec: caption.start_sec,
            play: true,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
