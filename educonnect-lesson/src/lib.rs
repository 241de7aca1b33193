//! # EduConnect Lesson Client
//!
//! Client-side lesson presence and navigation:
//! - Tab identity (`tab_identity`)
//! - Presence reporting to the tracking backend (`tracking`, `presence`)
//! - Timeline parsing and fetching (`timeline`)
//! - Lesson navigation and marker jumps (`navigation`)
//! - Lesson page loading (`content`)
//! - Lesson-aware chat (`chat`)

pub mod chat;
pub mod content;
pub mod error;
pub mod navigation;
pub mod presence;
pub mod tab_identity;
pub mod timeline;
pub mod tracking;

pub use error::{Error, Result};
pub use navigation::{JumpOutcome, LessonNavigator, PlaybackHandle, TimelineState};
pub use presence::{LessonContext, LessonPresence};
pub use tab_identity::TabIdProvider;
pub use timeline::{parse_timeline_text, TimelineMarker};
pub use tracking::{CurrentLessonView, TrackingClient};
