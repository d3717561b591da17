//! Wire and domain types for A2A routing.

use crate::a2a::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Identifiers ─────────────────────────────────────────────

/// Case-normalized agent name: ASCII letters, digits, `-` and `_` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentIdentifier(String);

impl AgentIdentifier {
    /// Validate and lowercase a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() || !raw.chars().all(is_identifier_char) {
            return Err(ValidationError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Characters allowed inside an identifier (and therefore inside a mention).
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl fmt::Display for AgentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AgentIdentifier {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AgentIdentifier> for String {
    fn from(id: AgentIdentifier) -> Self {
        id.0
    }
}

// ─── Directory ───────────────────────────────────────────────

/// A known peer. Owned by the [`AgentDirectory`](crate::a2a::AgentDirectory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub identifier: AgentIdentifier,
    pub display_name: String,
    pub inbound_endpoint: String,
    #[serde(default)]
    pub description: String,
}

/// One entry of the central directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryEntry {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ─── Messages ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub text: String,
    #[serde(rename = "type", default)]
    pub content_type: ContentType,
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            content_type: ContentType::Text,
        }
    }
}

/// Inbound message envelope. The conversation id is opaque and echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub content: MessageContent,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "new_conversation_id")]
    pub conversation_id: String,
}

fn default_role() -> String {
    "user".to_string()
}

fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            content: MessageContent::text(text),
            role: default_role(),
            conversation_id: conversation_id.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.content.text
    }
}

/// Reply envelope produced by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub content: MessageContent,
    pub role: String,
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
}

impl ReplyEnvelope {
    pub fn assistant(
        text: impl Into<String>,
        conversation_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            content: MessageContent::text(text),
            role: "assistant".to_string(),
            conversation_id: conversation_id.into(),
            timestamp: Utc::now(),
            agent_id: agent_id.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.content.text
    }
}

// ─── Registration ────────────────────────────────────────────

/// Query parameters of `POST /agents/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterParams {
    pub agent_id: String,
    pub agent_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub agent_id: String,
    pub total_known_agents: usize,
}

// ─── Local query (`POST /query`) ─────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "anonymous")]
    pub user_id: String,
}

fn anonymous() -> String {
    "anonymous".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time: f64,
}
