//! Placeholder Responder
//!
//! Used when no model endpoint is configured. Lets the gateway start and keep
//! forwarding `@agent` messages while local questions fail cleanly.

use async_trait::async_trait;

use super::{LocalResponder, ResponderError, Result};

pub struct PlaceholderResponder;

#[async_trait]
impl LocalResponder for PlaceholderResponder {
    async fn respond(&self, _text: &str, _conversation_id: &str) -> Result<String> {
        Err(ResponderError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_always_fails() {
        let err = PlaceholderResponder
            .respond("What is 2+2?", "conv-1")
            .await
            .expect_err("not configured");
        assert!(matches!(err, ResponderError::NotConfigured));
    }
}
