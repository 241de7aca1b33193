//! Tracking backend HTTP client

use super::types::{CurrentLessonView, Dispatch, EnterLesson};
use crate::error::{check_status, Error, Result};
use crate::tab_identity::TabIdProvider;
use educonnect_common::auth::{bearer_value, TokenSource};
use educonnect_common::config::ClientConfig;
use educonnect_common::events::PresenceEvent;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("educonnect-lesson/", env!("CARGO_PKG_VERSION"));

/// Client for the tracking backend
///
/// Cheap to clone; clones share the connection pool, token source and tab
/// identity.
#[derive(Clone)]
pub struct TrackingClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    tokens: Arc<dyn TokenSource>,
    tabs: TabIdProvider,
}

impl TrackingClient {
    /// Create a client for the backend at `base_url`
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenSource>,
        tabs: TabIdProvider,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        Url::parse(base_url).map_err(|e| {
            educonnect_common::Error::Config(format!("invalid backend URL '{}': {}", base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url),
            tokens,
            tabs,
        })
    }

    pub fn from_config(
        config: &ClientConfig,
        tokens: Arc<dyn TokenSource>,
        tabs: TabIdProvider,
    ) -> Result<Self> {
        Self::new(config.backend_base(), tokens, tabs, config.request_timeout())
    }

    pub fn tab_ids(&self) -> &TabIdProvider {
        &self.tabs
    }

    /// Report that a lesson view mounted in this tab
    ///
    /// Best-effort: returns the backend's response body, or `None` when the
    /// request failed for any reason.
    pub async fn enter_lesson(&self, request: EnterLesson) -> Option<Value> {
        let tab_id = self.tabs.resolve(request.tab_id.as_deref());
        self.report(PresenceEvent::Enter {
            user_id: request.user_id,
            lesson_id: request.lesson_id,
            series_id: request.series_id,
            lesson_title: request.lesson_title,
            tab_id,
        })
        .await
    }

    /// Report that the lesson view in this tab went away
    ///
    /// The request runs on a detached task, so dropping this future (page
    /// teardown) does not cancel it.
    pub async fn exit_lesson(&self, user_id: &str, tab_id: Option<&str>) -> Option<Value> {
        let tab_id = self.tabs.resolve(tab_id);
        self.report(PresenceEvent::Exit {
            user_id: user_id.to_string(),
            tab_id,
        })
        .await
    }

    /// Report that this tab gained focus
    pub async fn update_focus(&self, user_id: &str, tab_id: Option<&str>) -> Option<Value> {
        let tab_id = self.tabs.resolve(tab_id);
        self.report(PresenceEvent::Focus {
            user_id: user_id.to_string(),
            tab_id,
        })
        .await
    }

    /// Send a presence event with the dispatch mode its kind requires
    pub async fn report(&self, event: PresenceEvent) -> Option<Value> {
        match Dispatch::for_kind(event.kind()) {
            Dispatch::Scoped => self.send_best_effort(event).await,
            Dispatch::KeepAlive => match self.spawn_keepalive(event).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Keep-alive presence task failed");
                    None
                }
            },
        }
    }

    /// Start a presence request on a detached task
    ///
    /// The returned handle may be dropped; the request still completes.
    pub fn spawn_keepalive(&self, event: PresenceEvent) -> JoinHandle<Option<Value>> {
        let client = self.clone();
        tokio::spawn(async move { client.send_best_effort(event).await })
    }

    /// Ask the backend which lesson is current for `user_id`
    ///
    /// Unlike the writes, failures are returned to the caller.
    pub async fn get_current_lesson(&self, user_id: &str) -> Result<CurrentLessonView> {
        let url = self.current_lesson_url(user_id)?;
        debug!(user_id = %user_id, url = %url, "Fetching current lesson");

        let request = self.authorized(self.http.get(url)).await;
        let response = check_status(request.send().await.map_err(Error::from)?)
            .await
            .map_err(|e| {
                warn!(user_id = %user_id, error = %e, "Current lesson lookup failed");
                e
            })?;

        response.json::<CurrentLessonView>().await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Current lesson response malformed");
            Error::Decode(e.to_string())
        })
    }

    async fn send_best_effort(&self, event: PresenceEvent) -> Option<Value> {
        match self.send(&event).await {
            Ok(body) => {
                debug!(
                    kind = event.kind().as_str(),
                    tab_id = %event.tab_id(),
                    "Presence reported"
                );
                Some(body)
            }
            Err(e) => {
                warn!(
                    kind = event.kind().as_str(),
                    user_id = %event.user_id(),
                    tab_id = %event.tab_id(),
                    error = %e,
                    "Presence report failed"
                );
                None
            }
        }
    }

    async fn send(&self, event: &PresenceEvent) -> Result<Value> {
        let url = format!("{}{}", self.base_url, event.kind().path());
        let request = self.authorized(self.http.post(&url)).await.json(event);
        let response = check_status(request.send().await?).await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.tokens.id_token().await {
            Some(token) => builder.header(AUTHORIZATION, bearer_value(&token)),
            None => builder,
        }
    }

    fn current_lesson_url(&self, user_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Internal(format!("invalid backend URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Internal("backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["tracking", "user", user_id, "current"]);
        Ok(url)
    }
}
