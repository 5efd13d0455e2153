//! Common Type Aliases
//!
//! Shared identifier and unit types used throughout the engine.

/// Caption identifier: the SRT block sequence number at creation time.
///
/// Positive, and unique within a well-formed caption list, but uniqueness
/// is not enforced: duplicate ids in malformed service output are kept.
pub type CaptionId = u32;

/// Time position in seconds
pub type TimeSec = f64;

/// Unique identifier for one pipeline run (ULID)
pub type RunId = String;
