//! Lesson timelines
//!
//! A lesson record may point at a plain-text timeline document. It is parsed
//! into `TimelineMarker`s which the navigation surface uses to seek the video.

mod fetch;
mod parser;

pub use fetch::{fetch_and_parse_timeline, TimelineClient};
pub use parser::{clean_markdown, parse_timeline_text, time_string_to_seconds};

use serde::{Deserialize, Serialize};

/// A navigation point inside a lesson video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineMarker {
    /// Start time as written in the document (`MM:SS` or `HH:MM:SS`)
    pub time: String,
    /// Start time in seconds
    pub seconds: u64,
    pub label: String,
    pub desc: String,
}
