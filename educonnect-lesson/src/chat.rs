//! Lesson-aware chat session with the AI agent
//!
//! History is persisted as one JSON array under [`CHAT_HISTORY_KEY`]. The
//! lesson context decides what the agent is asked: questions asked inside a
//! lesson carry its id, anything else goes to the general channel.

use crate::error::{check_status, Error, Result};
use crate::tracking::CurrentLessonView;
use chrono::{DateTime, Utc};
use educonnect_common::config::ClientConfig;
use educonnect_common::storage::KeyValueStore;
use educonnect_common::time::now;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Storage key of the persisted history
pub const CHAT_HISTORY_KEY: &str = "chatHistory";

/// Lesson id sent when no lesson is open
pub const GENERAL_CHAT_ID: &str = "general_chat";

const TOP_K: u32 = 5;

const WELCOME_TEXT: &str = "Hello! I'm the EduConnect assistant 👋\n\
I can help you:\n\
- Learn about the courses\n\
- Find your way around the platform\n\
- Answer study questions\n\
Ask me anything!";

const NO_ANSWER_TEXT: &str = "Sorry, I couldn't find an answer.";

const CONNECTION_ERROR_TEXT: &str =
    "Sorry, I'm having trouble connecting. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// One entry of the chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set on the bot message recorded for a failed request
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now(),
            error: false,
        }
    }

    fn failure() -> Self {
        Self {
            error: true,
            ..Self::new(ChatRole::Bot, CONNECTION_ERROR_TEXT)
        }
    }
}

/// Lesson the chat is currently scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonChatContext {
    pub lesson_id: String,
    pub series_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    user_question: &'a str,
    user_id: &'a str,
    top_k: u32,
    lesson_id: &'a str,
    is_in_lesson: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    answer: Option<String>,
}

/// Chat history plus the agent it talks to
pub struct ChatSession {
    http: reqwest::Client,
    agent_url: String,
    store: Arc<dyn KeyValueStore>,
    history: Vec<ChatMessage>,
    context: Option<LessonChatContext>,
}

impl ChatSession {
    /// Open a session, loading persisted history
    ///
    /// An empty history is seeded with a welcome message.
    pub fn new(agent_url: &str, store: Arc<dyn KeyValueStore>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let mut session = Self {
            http,
            agent_url: agent_url.trim_end_matches('/').to_string(),
            history: load_history(store.as_ref()),
            store,
            context: None,
        };

        if session.history.is_empty() {
            session.history.push(ChatMessage::new(ChatRole::Bot, WELCOME_TEXT));
            session.persist();
        }
        Ok(session)
    }

    pub fn from_config(config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        Self::new(config.agent_base(), store, config.request_timeout())
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn current_lesson(&self) -> Option<&LessonChatContext> {
        self.context.as_ref()
    }

    pub fn set_current_lesson(&mut self, lesson_id: &str, series_id: Option<&str>) {
        self.context = Some(LessonChatContext {
            lesson_id: lesson_id.to_string(),
            series_id: series_id.map(str::to_string),
        });
    }

    pub fn clear_current_lesson(&mut self) {
        self.context = None;
    }

    /// Adopt the tracking backend's view of which lesson is current
    pub fn sync_lesson_context(&mut self, view: &CurrentLessonView) {
        match &view.current_lesson {
            Some(active) => {
                self.set_current_lesson(&active.lesson_id, active.series_id.as_deref())
            }
            None => self.clear_current_lesson(),
        }
        debug!(
            lesson_id = self.context.as_ref().map(|c| c.lesson_id.as_str()),
            "Chat lesson context synced"
        );
    }

    /// Ask the agent `text` on behalf of `user_id`
    ///
    /// Returns the bot reply, which is also appended to the history. On
    /// failure an error message is appended instead and the error returned.
    pub async fn send_message(&mut self, user_id: &str, text: &str) -> Result<ChatMessage> {
        self.history.push(ChatMessage::new(ChatRole::User, text));

        match self.query(user_id, text).await {
            Ok(answer) => {
                let reply = ChatMessage::new(ChatRole::Bot, answer);
                self.history.push(reply.clone());
                self.persist();
                Ok(reply)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Agent query failed");
                self.history.push(ChatMessage::failure());
                self.persist();
                Err(e)
            }
        }
    }

    /// Empty the history and drop the persisted copy
    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear();
        self.store.remove(CHAT_HISTORY_KEY)?;
        Ok(())
    }

    async fn query(&self, user_id: &str, text: &str) -> Result<String> {
        let (lesson_id, is_in_lesson) = match &self.context {
            Some(context) => (context.lesson_id.as_str(), true),
            None => (GENERAL_CHAT_ID, false),
        };
        let body = QueryRequest {
            user_question: text,
            user_id,
            top_k: TOP_K,
            lesson_id,
            is_in_lesson,
        };

        let url = format!("{}/query", self.agent_url);
        debug!(url = %url, lesson_id = %lesson_id, is_in_lesson, "Querying agent");

        let response = self.http.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;
        let parsed: QueryResponse = response.json().await?;

        let answer = parsed
            .answer
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| NO_ANSWER_TEXT.to_string());
        info!(lesson_id = %lesson_id, chars = answer.len(), "Agent answered");
        Ok(answer)
    }

    fn persist(&self) {
        let saved = serde_json::to_string(&self.history)
            .map_err(educonnect_common::Error::from)
            .and_then(|json| self.store.set(CHAT_HISTORY_KEY, &json));
        if let Err(e) = saved {
            warn!(error = %e, "Chat history not persisted");
        }
    }
}

fn load_history(store: &dyn KeyValueStore) -> Vec<ChatMessage> {
    let raw = match store.get(CHAT_HISTORY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "Chat history unreadable, starting fresh");
            return Vec::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "Chat history corrupt, starting fresh");
        Vec::new()
    })
}
