//! Outbound forwarding to a peer's inbound endpoint.
//!
//! At-most-once: a forward is attempted exactly once, bounded by the
//! configured timeout, and every failure mode is normalized into
//! [`DispatchError`]. There is deliberately no retry loop here.

use crate::a2a::error::DispatchError;
use crate::a2a::types::{InboundMessage, MessageContent};
use serde::Deserialize;
use std::time::Duration;

/// Default forward timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The only part of a peer's reply envelope we rely on.
#[derive(Debug, Deserialize)]
struct PeerReply {
    content: MessageContent,
}

#[derive(Clone)]
pub struct RemoteDispatcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), timeout)
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `text` to `endpoint` and return the peer's reply text.
    pub async fn forward(
        &self,
        endpoint: &str,
        text: &str,
        conversation_id: &str,
    ) -> Result<String, DispatchError> {
        let body = InboundMessage::new(text, conversation_id);

        tracing::debug!(endpoint, conversation_id, "A2A: Forwarding message");

        let resp = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        let bytes = resp.bytes().await.map_err(|e| self.classify(e))?;
        let reply: PeerReply = serde_json::from_slice(&bytes)
            .map_err(|e| DispatchError::InvalidBody(e.to_string()))?;
        Ok(reply.content.text)
    }

    fn classify(&self, err: reqwest::Error) -> DispatchError {
        if err.is_timeout() {
            DispatchError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else if err.is_connect() {
            DispatchError::Connect(err.to_string())
        } else {
            DispatchError::Transport(err.to_string())
        }
    }
}

impl Default for RemoteDispatcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}
