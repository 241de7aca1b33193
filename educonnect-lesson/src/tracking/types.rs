//! Tracking request and response types

use educonnect_common::events::PresenceKind;
use serde::{Deserialize, Serialize};

/// How a presence request is tied to its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Runs inside the caller's future; dropping the caller cancels it
    Scoped,
    /// Runs on a detached task; completes even if the caller is torn down
    KeepAlive,
}

impl Dispatch {
    /// Dispatch mode used for each kind of presence event
    ///
    /// Exit is the event most likely to be sent while the page is going away,
    /// so it never depends on the caller surviving.
    pub fn for_kind(kind: PresenceKind) -> Self {
        match kind {
            PresenceKind::Exit => Dispatch::KeepAlive,
            PresenceKind::Enter | PresenceKind::Focus => Dispatch::Scoped,
        }
    }
}

/// Arguments of `TrackingClient::enter_lesson`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnterLesson {
    pub user_id: String,
    pub lesson_id: String,
    pub series_id: String,
    pub lesson_title: Option<String>,
    /// Falls back to this tab's id when `None`
    pub tab_id: Option<String>,
}

/// One open lesson tab as reported by the tracking backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLesson {
    pub lesson_id: String,
    #[serde(default, rename = "serie_id", alias = "series_id")]
    pub series_id: Option<String>,
    #[serde(default)]
    pub lesson_title: Option<String>,
    #[serde(default)]
    pub tab_id: Option<String>,
}

/// Backend resolution of a user's lessons across all tabs
///
/// `current_lesson` belongs to the tab that last reported focus;
/// `active_lessons` lists every tab with an open lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentLessonView {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, alias = "current")]
    pub current_lesson: Option<ActiveLesson>,
    #[serde(default, alias = "active_tabs")]
    pub active_lessons: Vec<ActiveLesson>,
}

impl CurrentLessonView {
    pub fn is_in_lesson(&self) -> bool {
        self.current_lesson.is_some()
    }
}
