//! Lesson content records and page loading
//!
//! The content store is an external collaborator; only the records and the
//! fields this client reads are modelled here.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Name shown when the series owner cannot be looked up
pub const FALLBACK_OWNER_NAME: &str = "EduConnect Instructor";

/// Lesson record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: String,
    #[serde(default)]
    pub lesson_title: String,
    #[serde(default)]
    pub lesson_description: Option<String>,
    #[serde(default)]
    pub lesson_video: Option<String>,
    /// URL of the timeline text document
    #[serde(default)]
    pub lesson_timeline: Option<String>,
    #[serde(default)]
    pub lesson_documents: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// What the lesson view should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonMedia<'a> {
    Video(&'a str),
    Document(&'a str),
    Empty,
}

impl Lesson {
    /// Video first, then the first attached document
    pub fn media(&self) -> LessonMedia<'_> {
        if let Some(video) = self.lesson_video.as_deref().filter(|v| !v.is_empty()) {
            return LessonMedia::Video(video);
        }
        match self.lesson_documents.first() {
            Some(doc) if !doc.is_empty() => LessonMedia::Document(doc),
            _ => LessonMedia::Empty,
        }
    }

    /// Timeline URL, if the lesson has one
    pub fn timeline_url(&self) -> Option<&str> {
        self.lesson_timeline.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Series record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub serie_id: String,
    #[serde(default)]
    pub serie_title: String,
    /// User id of the series owner
    #[serde(default)]
    pub serie_user: Option<String>,
}

/// Series owner as shown on the lesson page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Owner {
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_OWNER_NAME.to_string(),
            avatar: None,
        }
    }
}

/// Read-only access to the content store
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_lesson(&self, series_id: &str, lesson_id: &str) -> Result<Lesson>;

    /// Lessons of a series in course order
    async fn list_lessons(&self, series_id: &str) -> Result<Vec<Lesson>>;

    async fn get_series(&self, series_id: &str) -> Result<Series>;

    async fn get_owner(&self, user_id: &str) -> Result<Owner>;
}

/// Everything the lesson page needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPage {
    pub lesson: Lesson,
    pub series: Series,
    /// `None` when the series names no owner
    pub owner: Option<Owner>,
    pub all_lessons: Vec<Lesson>,
}

impl LessonPage {
    /// Position of the current lesson in the series
    pub fn position(&self) -> Option<usize> {
        self.all_lessons
            .iter()
            .position(|l| l.lesson_id == self.lesson.lesson_id)
    }

    pub fn previous_lesson(&self) -> Option<&Lesson> {
        let index = self.position()?;
        index.checked_sub(1).and_then(|i| self.all_lessons.get(i))
    }

    pub fn next_lesson(&self) -> Option<&Lesson> {
        let index = self.position()?;
        self.all_lessons.get(index + 1)
    }
}

/// Load lesson, sibling lessons, series and owner
///
/// Lesson, list and series failures propagate. An owner lookup failure is
/// replaced by the placeholder owner.
pub async fn load_lesson_page(
    store: &dyn ContentStore,
    series_id: &str,
    lesson_id: &str,
) -> Result<LessonPage> {
    let lesson = store.get_lesson(series_id, lesson_id).await?;
    let all_lessons = store.list_lessons(series_id).await?;
    let series = store.get_series(series_id).await?;

    let owner = match series.serie_user.as_deref().filter(|u| !u.is_empty()) {
        Some(user_id) => match store.get_owner(user_id).await {
            Ok(owner) => Some(owner),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Series owner lookup failed, using placeholder");
                Some(Owner::fallback())
            }
        },
        None => None,
    };

    debug!(
        series_id = %series_id,
        lesson_id = %lesson_id,
        siblings = all_lessons.len(),
        "Lesson page loaded"
    );

    Ok(LessonPage {
        lesson,
        series,
        owner,
        all_lessons,
    })
}
