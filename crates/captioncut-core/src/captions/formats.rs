//! SRT Parsing and Export
//!
//! Bidirectional conversion between SRT text and the caption model.
//!
//! Parsing is total and best-effort: the transcription service can return
//! empty or partially malformed documents, so individual blocks that fail
//! validation are dropped and counted rather than failing the run. Export
//! is the structural inverse of the parser's expected input shape, so
//! parse -> export -> parse round-trips well-formed documents.

use std::sync::OnceLock;

use regex::Regex;

use super::models::Caption;
use crate::TimeSec;

/// Suffix appended to the original file stem for exported subtitle files
const EXPORT_SUFFIX: &str = "_CaptionCut.srt";

fn timestamp_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{2}:\d{2}:\d{2},\d{3}) --> (\d{2}:\d{2}:\d{2},\d{3})")
            .expect("timestamp pattern is valid")
    })
}

fn block_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // One or more whitespace-only lines between blocks.
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("separator pattern is valid"))
}

// =============================================================================
// Parse Result
// =============================================================================

/// Outcome of parsing one SRT document.
///
/// `dropped_blocks` counts candidate blocks discarded as malformed. The
/// pipeline only logs it, but it is exposed so callers can surface a
/// partial-success signal without an interface change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedCaptions {
    /// Captions in document order
    pub captions: Vec<Caption>,
    /// Number of malformed blocks that were discarded
    pub dropped_blocks: usize,
}

// =============================================================================
// SRT Parsing
// =============================================================================

/// Parses SRT text into captions, dropping malformed blocks.
///
/// Blocks are separated by blank lines. A valid block is an integer id
/// line, a `HH:MM:SS,mmm --> HH:MM:SS,mmm` timestamp line, and any number
/// of text lines which are joined with a single space (multi-line captions
/// are deliberately flattened). Blocks are emitted in input order and
/// never re-sorted; duplicate ids are kept. Blocks whose start does not
/// precede their end are dropped like any other malformed block.
pub fn parse_srt(text: &str) -> ParsedCaptions {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ParsedCaptions::default();
    }

    let mut result = ParsedCaptions::default();
    for block in block_separator_re().split(trimmed) {
        match parse_block(block) {
            Some(caption) => result.captions.push(caption),
            None => {
                tracing::debug!("dropping malformed subtitle block: {block:?}");
                result.dropped_blocks += 1;
            }
        }
    }
    result
}

/// Parses a single candidate block; `None` means the block is discarded.
fn parse_block(block: &str) -> Option<Caption> {
    let lines: Vec<&str> = block.lines().collect();
    if lines.len() < 2 {
        return None;
    }

    let id = lines[0].trim().parse().ok()?;
    let captures = timestamp_pair_re().captures(lines[1])?;
    let start_time = captures[1].to_string();
    let end_time = captures[2].to_string();
    let start_sec = srt_time_to_seconds(&start_time)?;
    let end_sec = srt_time_to_seconds(&end_time)?;
    if start_sec >= end_sec {
        return None;
    }

    Some(Caption {
        id,
        start_time,
        end_time,
        start_sec,
        end_sec,
        text: lines[2..].join(" "),
    })
}

/// Converts "HH:MM:SS,mmm" to float seconds.
fn srt_time_to_seconds(time: &str) -> Option<TimeSec> {
    let (clock, millis) = time.split_once(',')?;
    let mut parts = clock.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    let millis: f64 = millis.parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
}

// =============================================================================
// SRT Export
// =============================================================================

/// Serializes captions back to SRT text.
///
/// Emits `id`, timestamp line, and the single text line per caption, with
/// one blank line between blocks, the exact shape the parser expects.
pub fn export_srt(captions: &[Caption]) -> String {
    captions
        .iter()
        .map(|c| {
            format!(
                "{}\n{} --> {}\n{}\n",
                c.id, c.start_time, c.end_time, c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the export artifact name: `<original-stem>_CaptionCut.srt`.
pub fn export_file_name(original_name: &str) -> String {
    let stem = match original_name.rfind('.') {
        Some(idx) if idx > 0 => &original_name[..idx],
        _ => original_name,
    };
    format!("{stem}{EXPORT_SUFFIX}")
}

// =============================================================================
// Tests
// =============================================================================
