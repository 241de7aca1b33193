//! Event types for the lesson client
//!
//! Two families live here:
//! - `PresenceEvent`: what a tab reports to the tracking backend
//! - `ViewEvent`: what the host (browser tab, test harness) tells a lesson view
//!   about focus, visibility and page teardown, broadcast via `ViewEventBus`

use serde::Serialize;
use tokio::sync::broadcast;

/// Presence notification sent to the tracking backend
///
/// Serializes to the request body of the matching tracking endpoint. The
/// series id goes over the wire as `serie_id`; an absent lesson title is
/// omitted from the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PresenceEvent {
    /// Lesson view mounted in a tab
    Enter {
        user_id: String,
        lesson_id: String,
        #[serde(rename = "serie_id")]
        series_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        lesson_title: Option<String>,
        tab_id: String,
    },

    /// Lesson view unmounted or page unloading
    Exit { user_id: String, tab_id: String },

    /// Tab gained focus or became visible
    Focus { user_id: String, tab_id: String },
}

/// Discriminant of a `PresenceEvent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceKind {
    Enter,
    Exit,
    Focus,
}

impl PresenceKind {
    /// Endpoint path relative to the backend base URL
    pub fn path(self) -> &'static str {
        match self {
            PresenceKind::Enter => "/tracking/lesson/enter",
            PresenceKind::Exit => "/tracking/lesson/exit",
            PresenceKind::Focus => "/tracking/lesson/focus",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PresenceKind::Enter => "enter",
            PresenceKind::Exit => "exit",
            PresenceKind::Focus => "focus",
        }
    }
}

impl PresenceEvent {
    pub fn kind(&self) -> PresenceKind {
        match self {
            PresenceEvent::Enter { .. } => PresenceKind::Enter,
            PresenceEvent::Exit { .. } => PresenceKind::Exit,
            PresenceEvent::Focus { .. } => PresenceKind::Focus,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            PresenceEvent::Enter { user_id, .. }
            | PresenceEvent::Exit { user_id, .. }
            | PresenceEvent::Focus { user_id, .. } => user_id,
        }
    }

    pub fn tab_id(&self) -> &str {
        match self {
            PresenceEvent::Enter { tab_id, .. }
            | PresenceEvent::Exit { tab_id, .. }
            | PresenceEvent::Focus { tab_id, .. } => tab_id,
        }
    }
}

/// Host notifications delivered to a lesson view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// Tab window gained focus
    FocusGained,

    /// Document visibility changed
    VisibilityChanged { visible: bool },

    /// Page is being torn down; pending ordinary requests may be cancelled
    Unloading,
}

/// Broadcast bus for `ViewEvent`s of one tab
///
/// Subscribers only see events emitted after they subscribed. Dropping the
/// receiver is the unsubscribe.
#[derive(Debug, Clone)]
pub struct ViewEventBus {
    tx: broadcast::Sender<ViewEvent>,
}

impl ViewEventBus {
    /// Creates a new bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the number of subscribers that received it; having none is not
    /// an error for view events.
    pub fn emit(&self, event: ViewEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ViewEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
