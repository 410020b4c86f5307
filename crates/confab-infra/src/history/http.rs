//! HttpHistorySource -- concrete [`HistorySource`] over the chat server's
//! REST API.
//!
//! Issues `GET {backend}/api/chat/messages/{session_id}` once per call. No
//! retries: a failed fetch is reported and the session starts empty.

use std::time::Duration;

use reqwest::Url;

use confab_core::chat::HistorySource;
use confab_types::error::HistoryError;
use confab_types::protocol::{HistoryResponse, HistoryTurn};

pub struct HttpHistorySource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpHistorySource {
    /// Create a source for `backend_url` with a per-request `timeout`.
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self, HistoryError> {
        let base_url = Url::parse(backend_url.trim())
            .map_err(|e| HistoryError::Transport(format!("invalid backend url '{backend_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(HistoryError::Transport(format!("invalid backend url '{backend_url}'")));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HistoryError::Transport(format!("failed to create http client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// URL of the history endpoint for one session. The id is
    /// percent-encoded as a single path segment.
    pub fn url(&self, session_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "chat", "messages", session_id]);
        }
        url
    }
}

impl HistorySource for HttpHistorySource {
    async fn fetch(&self, session_id: &str) -> Result<Vec<HistoryTurn>, HistoryError> {
        let url = self.url(session_id);
        tracing::debug!(%url, "Fetching history");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HistoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: HistoryResponse = response
            .json()
            .await
            .map_err(|e| HistoryError::Decode(e.to_string()))?;
        Ok(body.messages)
    }
}
