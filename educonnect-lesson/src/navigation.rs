//! Lesson navigation surface
//!
//! Owns, for the lesson currently on screen:
//! - its position in the series lesson list (prev/next)
//! - the single playback handle of its video
//! - its parsed timeline markers
//!
//! Switching lessons discards the playback binding and the markers; nothing
//! carries over from one lesson to the next. Timeline loads are tagged with a
//! generation so a slow fetch cannot overwrite a newer one or land on another
//! lesson.

use crate::content::Lesson;
use crate::error::{Error, Result};
use crate::timeline::{TimelineClient, TimelineMarker};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Playback control for one video element
#[async_trait]
pub trait PlaybackHandle: Send {
    /// Move the playback position
    fn seek(&mut self, seconds: u64);

    /// Ask the host to start or continue playing
    async fn resume(&mut self) -> std::result::Result<(), PlaybackError>;
}

/// Why the host refused to resume playback
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Host autoplay policy blocked playback (expected, not fatal)
    #[error("Autoplay prevented: {0}")]
    AutoplayBlocked(String),

    /// Any other refusal
    #[error("Playback failed: {0}")]
    Failed(String),
}

/// Result of activating a timeline marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    /// Seeked and playing
    Playing,
    /// Seeked, but the host refused to resume
    ResumeRejected,
    /// No playback handle bound; nothing happened
    NoPlayback,
}

/// Timeline status of the current lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineState {
    /// The lesson has no timeline document
    NotProvided,
    /// A fetch is outstanding
    Loading,
    /// Fetched and parsed; may be empty
    Loaded(Vec<TimelineMarker>),
    /// Fetch failed; the page shows a load error
    Failed(String),
}

/// Identifies one timeline load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineTicket {
    generation: u64,
    pub lesson_id: String,
    pub url: String,
}

/// Navigation state for one series
pub struct LessonNavigator {
    lessons: Vec<Lesson>,
    current: Option<usize>,
    playback: Option<Box<dyn PlaybackHandle>>,
    timeline: TimelineState,
    generation: u64,
}

impl LessonNavigator {
    /// Navigator over `lessons` (course order) with no lesson open
    pub fn new(lessons: Vec<Lesson>) -> Self {
        Self {
            lessons,
            current: None,
            playback: None,
            timeline: TimelineState::NotProvided,
            generation: 0,
        }
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.current.and_then(|i| self.lessons.get(i))
    }

    pub fn timeline(&self) -> &TimelineState {
        &self.timeline
    }

    /// Markers of the current lesson (empty unless loaded)
    pub fn markers(&self) -> &[TimelineMarker] {
        match &self.timeline {
            TimelineState::Loaded(markers) => markers,
            _ => &[],
        }
    }

    pub fn has_playback(&self) -> bool {
        self.playback.is_some()
    }

    /// Open the lesson with `lesson_id`
    pub fn open_lesson(&mut self, lesson_id: &str) -> Result<&Lesson> {
        let index = self
            .lessons
            .iter()
            .position(|l| l.lesson_id == lesson_id)
            .ok_or_else(|| Error::NotFound(format!("lesson {} not in series", lesson_id)))?;
        self.switch_to(index);
        Ok(&self.lessons[index])
    }

    pub fn previous_lesson(&self) -> Option<&Lesson> {
        let index = self.current?.checked_sub(1)?;
        self.lessons.get(index)
    }

    pub fn next_lesson(&self) -> Option<&Lesson> {
        let index = self.current? + 1;
        self.lessons.get(index)
    }

    /// Whether the "previous" affordance is enabled
    pub fn has_previous(&self) -> bool {
        self.previous_lesson().is_some()
    }

    /// Whether the "next" affordance is enabled
    pub fn has_next(&self) -> bool {
        self.next_lesson().is_some()
    }

    /// Move to the next lesson; `None` (and no change) at the end
    pub fn next(&mut self) -> Option<&Lesson> {
        let index = self.current? + 1;
        if index >= self.lessons.len() {
            debug!("Already at last lesson");
            return None;
        }
        self.switch_to(index);
        self.lessons.get(index)
    }

    /// Move to the previous lesson; `None` (and no change) at the start
    pub fn previous(&mut self) -> Option<&Lesson> {
        let Some(index) = self.current.and_then(|i| i.checked_sub(1)) else {
            debug!("Already at first lesson");
            return None;
        };
        self.switch_to(index);
        self.lessons.get(index)
    }

    /// Bind the video of the current lesson, replacing any previous binding
    pub fn bind_playback(&mut self, handle: Box<dyn PlaybackHandle>) {
        self.playback = Some(handle);
    }

    /// Seek the bound video to `seconds` and ask it to play
    ///
    /// The seek happens exactly once whether or not resume succeeds. A
    /// refused resume is logged and reported in the outcome only.
    pub async fn jump_to_marker(&mut self, seconds: u64) -> JumpOutcome {
        let Some(playback) = self.playback.as_mut() else {
            debug!(seconds, "No playback bound, ignoring marker jump");
            return JumpOutcome::NoPlayback;
        };

        playback.seek(seconds);
        match playback.resume().await {
            Ok(()) => JumpOutcome::Playing,
            Err(e) => {
                info!(seconds, error = %e, "Playback resume rejected after seek");
                JumpOutcome::ResumeRejected
            }
        }
    }

    /// Jump to the marker at `index` in the loaded timeline
    pub async fn activate_marker(&mut self, index: usize) -> Option<JumpOutcome> {
        let seconds = self.markers().get(index)?.seconds;
        Some(self.jump_to_marker(seconds).await)
    }

    /// Start loading the current lesson's timeline
    ///
    /// Returns `None` when no lesson is open or it has no timeline (state
    /// becomes `NotProvided`); otherwise the state becomes `Loading`. Each
    /// ticket supersedes every earlier one, for this lesson or another.
    pub fn begin_timeline_load(&mut self) -> Option<TimelineTicket> {
        let lesson = self.current_lesson()?;
        let Some(url) = lesson.timeline_url() else {
            self.timeline = TimelineState::NotProvided;
            return None;
        };
        let lesson_id = lesson.lesson_id.clone();
        let url = url.to_string();

        self.generation += 1;
        self.timeline = TimelineState::Loading;
        Some(TimelineTicket {
            generation: self.generation,
            lesson_id,
            url,
        })
    }

    /// Apply a finished load; stale tickets are ignored
    ///
    /// Returns whether the result was applied.
    pub fn finish_timeline_load(
        &mut self,
        ticket: TimelineTicket,
        result: Result<Vec<TimelineMarker>>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(lesson_id = %ticket.lesson_id, "Discarding superseded timeline load");
            return false;
        }
        self.timeline = match result {
            Ok(markers) => TimelineState::Loaded(markers),
            Err(e) => {
                warn!(lesson_id = %ticket.lesson_id, error = %e, "Timeline unavailable");
                TimelineState::Failed(e.to_string())
            }
        };
        true
    }

    /// Fetch and apply the current lesson's timeline
    pub async fn load_timeline(&mut self, client: &TimelineClient) -> &TimelineState {
        if let Some(ticket) = self.begin_timeline_load() {
            let result = client.fetch_and_parse(&ticket.url).await;
            self.finish_timeline_load(ticket, result);
        }
        &self.timeline
    }

    fn switch_to(&mut self, index: usize) {
        self.current = Some(index);
        self.playback = None;
        self.timeline = TimelineState::NotProvided;
        self.generation += 1;
        debug!(
            lesson_id = %self.lessons[index].lesson_id,
            generation = self.generation,
            "Switched lesson"
        );
    }
}
