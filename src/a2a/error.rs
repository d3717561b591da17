//! Error taxonomy for the A2A subsystem.
//!
//! Only `ValidationError` and `RoutingError` ever reach a caller as an error.
//! Unknown targets and dispatch failures are folded into a normal reply
//! envelope by the router, so callers always get something parsable back.

use thiserror::Error;

/// Malformed identifier or endpoint during registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid agent identifier '{0}': use only letters, digits, '-' or '_'")]
    InvalidIdentifier(String),

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Rejections raised by the router before any work is done.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Strict-mode entry point received a message without an `@agent` mention.
    #[error(
        "this endpoint only accepts agent-to-agent messages; mention a target with @agent-id \
         or send local questions to POST /query (message was: \"{text}\")"
    )]
    RoutingRequired { text: String },
}

/// Normalized failure of an outbound forward.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("peer answered with HTTP {0}")]
    Status(u16),

    #[error("unreadable reply: {0}")]
    InvalidBody(String),

    #[error("request failed: {0}")]
    Transport(String),
}

/// Failure of the startup bulk fetch from the central directory.
#[derive(Debug, Error)]
pub enum DirectoryFetchError {
    #[error("directory request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("directory answered with HTTP {0}")]
    Status(u16),

    #[error("malformed directory payload: {0}")]
    Payload(#[from] serde_json::Error),
}
