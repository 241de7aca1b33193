//! Timeline document retrieval

use super::{parse_timeline_text, TimelineMarker};
use crate::error::{check_status, Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches timeline documents over HTTP
#[derive(Debug, Clone)]
pub struct TimelineClient {
    http: reqwest::Client,
}

impl TimelineClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { http })
    }

    /// Download the document at `url` and parse it
    ///
    /// Transport failures and non-success statuses are errors; a document
    /// that parses to no markers is a successful empty result.
    pub async fn fetch_and_parse(&self, url: &str) -> Result<Vec<TimelineMarker>> {
        debug!(url = %url, "Fetching timeline");

        let result = async {
            let response = self.http.get(url).send().await?;
            let response = check_status(response).await?;
            Ok::<_, Error>(response.text().await?)
        }
        .await;

        let text = result.map_err(|e| {
            warn!(url = %url, error = %e, "Timeline fetch failed");
            e
        })?;

        let markers = parse_timeline_text(&text);
        info!(url = %url, markers = markers.len(), "Timeline loaded");
        Ok(markers)
    }
}

/// One-shot fetch with a default client
pub async fn fetch_and_parse_timeline(url: &str) -> Result<Vec<TimelineMarker>> {
    TimelineClient::new(DEFAULT_TIMEOUT)?.fetch_and_parse(url).await
}
