//! Caption Module
//!
//! Caption data model, the timeline over a completed run, and SRT
//! parsing/export:
//! - `models.rs`: [`Caption`], [`CaptionTimeline`], [`SeekTarget`]
//! - `formats.rs`: tolerant SRT parsing and canonical SRT export

mod formats;
mod models;

pub use formats::{export_file_name, export_srt, parse_srt, ParsedCaptions};
pub use models::{Caption, CaptionTimeline, SeekTarget};
