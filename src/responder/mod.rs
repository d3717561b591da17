//! Local Responder
//!
//! The opaque capability that answers a message addressed to this agent.
//! Routing never looks inside it; it only sees a text in and a text (or an
//! error) out.

pub mod chat;
pub mod placeholder;

use async_trait::async_trait;
use thiserror::Error;

pub use chat::ChatCompletionResponder;
pub use placeholder::PlaceholderResponder;

#[derive(Debug, Clone, Error)]
pub enum ResponderError {
    #[error("No local responder configured. Set responder.api_key or OPENAI_API_KEY.")]
    NotConfigured,

    #[error("responder request failed: {0}")]
    Request(String),

    #[error("responder returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("responder returned no answer")]
    Empty,
}

pub type Result<T> = std::result::Result<T, ResponderError>;

/// Answers queries handled locally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalResponder: Send + Sync {
    async fn respond(&self, text: &str, conversation_id: &str) -> Result<String>;
}
