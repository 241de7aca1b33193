//! Auth port
//!
//! The identity collaborator issues the bearer credential. The lesson client
//! only asks for the current id token; an absent token is a normal state
//! (guest viewing) and requests go out without an `Authorization` header.

use async_trait::async_trait;

/// Source of the session's id token
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current id token, or `None` when there is no signed-in session
    ///
    /// Implementations swallow their own lookup failures and return `None`.
    async fn id_token(&self) -> Option<String>;
}

/// No signed-in session
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSession;

#[async_trait]
impl TokenSource for NoSession {
    async fn id_token(&self) -> Option<String> {
        None
    }
}

/// Fixed token handed over by the identity collaborator
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn id_token(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Build the `Authorization` header value for a token
pub fn bearer_value(token: &str) -> String {
    format!("Bearer {}", token)
}
