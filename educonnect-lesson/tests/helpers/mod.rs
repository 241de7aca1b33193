//! Test Helper Utilities
//!
//! Shared utilities for testing educonnect-lesson

#![allow(dead_code)]

pub mod mock_backend;

pub use mock_backend::{MockBackend, MockBehaviour, Recorded};

use std::sync::Arc;
use std::time::Duration;

use educonnect_common::auth::{NoSession, StaticToken, TokenSource};
use educonnect_common::storage::MemoryStore;
use educonnect_lesson::{TabIdProvider, TrackingClient};

/// Poll `condition` every 10ms until it holds or `timeout` passes
pub async fn wait_for<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Tracking client for `backend`, with a fresh in-memory tab store
pub fn tracking_client(backend: &MockBackend, token: Option<&str>) -> TrackingClient {
    let tokens: Arc<dyn TokenSource> = match token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(NoSession),
    };
    TrackingClient::new(
        &backend.base_url(),
        tokens,
        TabIdProvider::new(Arc::new(MemoryStore::new())),
        Duration::from_secs(5),
    )
    .expect("mock backend URL is valid")
}
