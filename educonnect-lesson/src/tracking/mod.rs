//! Presence reporting toward the external tracking backend
//!
//! **Responsibilities:**
//! - Send Enter/Exit/Focus presence events, best-effort
//! - Keep Exit alive past teardown of the calling scope
//! - Read the backend's resolution of the user's current lesson

mod client;
mod types;

pub use client::TrackingClient;
pub use types::{ActiveLesson, CurrentLessonView, Dispatch, EnterLesson};
