//! Message router.
//!
//! Routing is split in two: [`decide`] is a pure function from message text
//! and entry-point mode to a [`RoutingDecision`], and [`Router::route`]
//! interprets that decision against the directory, the dispatcher and the
//! local responder.
//!
//! ```text
//! Received → Parsed → Routing    → Responded
//!                   → Processing → Responded | Failed
//!                   → Rejected   (strict mode, no mention)
//! ```
//!
//! Unknown targets and failed forwards still yield a normal reply envelope;
//! only a strict-mode rejection is returned as an error.

use crate::a2a::directory::AgentDirectory;
use crate::a2a::dispatcher::RemoteDispatcher;
use crate::a2a::error::{DispatchError, RoutingError};
use crate::a2a::mention;
use crate::a2a::routing_log::{RoutingLog, RoutingPhase};
use crate::a2a::types::{AgentIdentifier, InboundMessage, ReplyEnvelope};
use crate::responder::{LocalResponder, ResponderError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How an entry point treats messages without a mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Unmentioned messages are answered locally.
    #[default]
    Permissive,
    /// Every message must name a target agent.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Local,
    /// Single hop to the first mention; `text` has that mention removed and
    /// may be empty.
    Forward {
        target: AgentIdentifier,
        text: String,
    },
    Rejected(RoutingError),
}

/// Decide what to do with `text` without touching any state.
pub fn decide(text: &str, mode: RoutingMode) -> RoutingDecision {
    match mention::find_mentions(text).into_iter().next() {
        Some(first) => RoutingDecision::Forward {
            text: mention::strip_mention(text, &first.span),
            target: first.target,
        },
        None => match mode {
            RoutingMode::Permissive => RoutingDecision::Local,
            RoutingMode::Strict => RoutingDecision::Rejected(RoutingError::RoutingRequired {
                text: text.to_string(),
            }),
        },
    }
}

/// What actually happened to a routed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Answered,
    Forwarded { target: AgentIdentifier },
    AgentNotFound { target: AgentIdentifier },
    DispatchFailed { target: AgentIdentifier, error: DispatchError },
    LocalFailed { error: String },
}

impl RouteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Answered | Self::Forwarded { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RoutedReply {
    pub envelope: ReplyEnvelope,
    pub outcome: RouteOutcome,
}

pub struct Router {
    agent_id: String,
    directory: AgentDirectory,
    dispatcher: RemoteDispatcher,
    responder: Arc<dyn LocalResponder>,
    log: RoutingLog,
}

impl Router {
    pub fn new(
        agent_id: impl Into<String>,
        directory: AgentDirectory,
        dispatcher: RemoteDispatcher,
        responder: Arc<dyn LocalResponder>,
        log: RoutingLog,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            directory,
            dispatcher,
            responder,
            log,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    /// Route one inbound message.
    pub async fn route(
        &self,
        msg: &InboundMessage,
        mode: RoutingMode,
    ) -> Result<RoutedReply, RoutingError> {
        let conversation_id = msg.conversation_id.as_str();
        self.log
            .phase(conversation_id, RoutingPhase::Incoming, None, msg.text());

        match decide(msg.text(), mode) {
            RoutingDecision::Rejected(err) => {
                self.log
                    .phase(conversation_id, RoutingPhase::Error, None, &err.to_string());
                tracing::info!(conversation_id, "A2A: Rejected unaddressed message");
                Err(err)
            }
            RoutingDecision::Local => Ok(self.process_locally(msg.text(), conversation_id).await),
            RoutingDecision::Forward { target, text } => {
                Ok(self.forward(target, &text, conversation_id).await)
            }
        }
    }

    /// Answer through the local responder only. Never routes.
    pub async fn answer_locally(
        &self,
        text: &str,
        conversation_id: &str,
    ) -> Result<String, ResponderError> {
        self.log
            .phase(conversation_id, RoutingPhase::Incoming, None, text);
        self.log
            .phase(conversation_id, RoutingPhase::Processing, None, text);
        match self.responder.respond(text, conversation_id).await {
            Ok(answer) => {
                self.log
                    .phase(conversation_id, RoutingPhase::Success, None, &answer);
                Ok(answer)
            }
            Err(e) => {
                self.log
                    .phase(conversation_id, RoutingPhase::Error, None, &e.to_string());
                Err(e)
            }
        }
    }

    async fn process_locally(&self, text: &str, conversation_id: &str) -> RoutedReply {
        self.log
            .phase(conversation_id, RoutingPhase::Processing, None, text);

        let (reply_text, outcome) = match self.responder.respond(text, conversation_id).await {
            Ok(answer) => {
                self.log
                    .phase(conversation_id, RoutingPhase::Success, None, &answer);
                (answer, RouteOutcome::Answered)
            }
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "A2A: Local responder failed");
                self.log
                    .phase(conversation_id, RoutingPhase::Error, None, &e.to_string());
                (
                    format!("Error processing message: {e}"),
                    RouteOutcome::LocalFailed {
                        error: e.to_string(),
                    },
                )
            }
        };

        RoutedReply {
            envelope: ReplyEnvelope::assistant(reply_text, conversation_id, &self.agent_id),
            outcome,
        }
    }

    async fn forward(
        &self,
        target: AgentIdentifier,
        text: &str,
        conversation_id: &str,
    ) -> RoutedReply {
        self.log
            .phase(conversation_id, RoutingPhase::Routing, Some(&target), text);

        // Clone the record out; the directory lock is released before dispatch.
        let Some(record) = self.directory.lookup(&target).await else {
            let known = self.directory.known_identifiers().await;
            let reply_text = not_found_text(&target, &known);
            self.log
                .phase(conversation_id, RoutingPhase::Error, Some(&target), &reply_text);
            tracing::info!(conversation_id, agent = %target, "A2A: Unknown target agent");
            return RoutedReply {
                envelope: ReplyEnvelope::assistant(reply_text, conversation_id, &self.agent_id),
                outcome: RouteOutcome::AgentNotFound { target },
            };
        };

        match self
            .dispatcher
            .forward(&record.inbound_endpoint, text, conversation_id)
            .await
        {
            Ok(reply) => {
                self.log
                    .phase(conversation_id, RoutingPhase::Success, Some(&target), &reply);
                RoutedReply {
                    envelope: ReplyEnvelope::assistant(reply, conversation_id, &self.agent_id),
                    outcome: RouteOutcome::Forwarded { target },
                }
            }
            Err(error) => {
                let reply_text = format!("Error contacting agent @{target}: {error}");
                tracing::warn!(
                    conversation_id,
                    agent = %target,
                    endpoint = %record.inbound_endpoint,
                    error = %error,
                    "A2A: Forward failed"
                );
                self.log
                    .phase(conversation_id, RoutingPhase::Error, Some(&target), &reply_text);
                RoutedReply {
                    envelope: ReplyEnvelope::assistant(reply_text, conversation_id, &self.agent_id),
                    outcome: RouteOutcome::DispatchFailed { target, error },
                }
            }
        }
    }
}

/// Reply text for a mention nobody answers to.
pub fn not_found_text(target: &AgentIdentifier, known: &[AgentIdentifier]) -> String {
    let known = if known.is_empty() {
        "none".to_string()
    } else {
        known
            .iter()
            .map(AgentIdentifier::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("Agent @{target} not found. Known agents: {known}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::routing_log::MemorySink;
    use crate::responder::MockLocalResponder;
    use std::time::Duration;

    fn id(raw: &str) -> AgentIdentifier {
        AgentIdentifier::parse(raw).expect("identifier")
    }

    fn router_with(responder: MockLocalResponder) -> (Router, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let router = Router::new(
            "self-agent",
            AgentDirectory::new(),
            RemoteDispatcher::new(Duration::from_secs(2)),
            Arc::new(responder),
            RoutingLog::new(vec![sink.clone()]),
        );
        (router, sink)
    }

    fn phases(sink: &MemorySink, conversation_id: &str) -> Vec<RoutingPhase> {
        sink.for_conversation(conversation_id)
            .into_iter()
            .map(|e| e.phase)
            .collect()
    }

    // ── decide ──────────────────────────────────────────────

    #[test]
    fn test_decide_forwards_first_mention() {
        assert_eq!(
            decide("@alpha @beta check this", RoutingMode::Permissive),
            RoutingDecision::Forward {
                target: id("alpha"),
                text: "@beta check this".to_string(),
            }
        );
    }

    #[test]
    fn test_decide_mention_wins_in_strict_mode() {
        assert_eq!(
            decide("@alpha hello", RoutingMode::Strict),
            RoutingDecision::Forward {
                target: id("alpha"),
                text: "hello".to_string(),
            }
        );
    }

    #[test]
    fn test_decide_no_mention_by_mode() {
        assert_eq!(decide("hello", RoutingMode::Permissive), RoutingDecision::Local);
        assert_eq!(
            decide("hello", RoutingMode::Strict),
            RoutingDecision::Rejected(RoutingError::RoutingRequired {
                text: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_decide_mention_only_forwards_empty_text() {
        assert_eq!(
            decide("@alpha", RoutingMode::Permissive),
            RoutingDecision::Forward {
                target: id("alpha"),
                text: String::new(),
            }
        );
    }

    #[test]
    fn test_not_found_text_lists_known() {
        let text = not_found_text(&id("ghost"), &[id("alpha"), id("beta")]);
        assert_eq!(text, "Agent @ghost not found. Known agents: alpha, beta");
        assert!(not_found_text(&id("ghost"), &[]).ends_with("Known agents: none"));
    }

    // ── route ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_route_local_answer() {
        let mut responder = MockLocalResponder::new();
        responder
            .expect_respond()
            .withf(|text, conv| text == "What is 2+2?" && conv == "conv-1")
            .times(1)
            .returning(|_, _| Ok("4".to_string()));
        let (router, sink) = router_with(responder);

        let reply = router
            .route(&InboundMessage::new("What is 2+2?", "conv-1"), RoutingMode::Permissive)
            .await
            .expect("reply");

        assert_eq!(reply.envelope.text(), "4");
        assert_eq!(reply.envelope.agent_id, "self-agent");
        assert_eq!(reply.envelope.conversation_id, "conv-1");
        assert_eq!(reply.outcome, RouteOutcome::Answered);
        assert_eq!(
            phases(&sink, "conv-1"),
            vec![RoutingPhase::Incoming, RoutingPhase::Processing, RoutingPhase::Success]
        );
    }

    #[tokio::test]
    async fn test_route_strict_rejects_without_calling_responder() {
        let mut responder = MockLocalResponder::new();
        responder.expect_respond().times(0);
        let (router, sink) = router_with(responder);

        let err = router
            .route(&InboundMessage::new("hello", "conv-2"), RoutingMode::Strict)
            .await
            .expect_err("rejected");

        assert_eq!(
            err,
            RoutingError::RoutingRequired {
                text: "hello".to_string()
            }
        );
        assert_eq!(
            phases(&sink, "conv-2"),
            vec![RoutingPhase::Incoming, RoutingPhase::Error]
        );
    }

    #[tokio::test]
    async fn test_route_local_failure_is_folded() {
        let mut responder = MockLocalResponder::new();
        responder
            .expect_respond()
            .returning(|_, _| Err(ResponderError::NotConfigured));
        let (router, sink) = router_with(responder);

        let reply = router
            .route(&InboundMessage::new("hello", "conv-3"), RoutingMode::Permissive)
            .await
            .expect("reply");

        assert!(reply.envelope.text().starts_with("Error processing message"));
        assert!(matches!(reply.outcome, RouteOutcome::LocalFailed { .. }));
        assert!(!reply.outcome.is_success());
        assert_eq!(
            phases(&sink, "conv-3"),
            vec![RoutingPhase::Incoming, RoutingPhase::Processing, RoutingPhase::Error]
        );
    }

    #[tokio::test]
    async fn test_route_unknown_target_lists_known_agents() {
        let mut responder = MockLocalResponder::new();
        responder.expect_respond().times(0);
        let (router, sink) = router_with(responder);
        router
            .directory()
            .register("beta", "http://beta.example/a2a", None, None)
            .await
            .expect("register");

        let reply = router
            .route(&InboundMessage::new("@ghost hi", "conv-4"), RoutingMode::Strict)
            .await
            .expect("reply");

        assert!(reply.envelope.text().contains("ghost"));
        assert!(reply.envelope.text().contains("beta"));
        assert_eq!(reply.outcome, RouteOutcome::AgentNotFound { target: id("ghost") });
        let entries = sink.for_conversation("conv-4");
        assert_eq!(entries[1].phase, RoutingPhase::Routing);
        assert_eq!(entries[1].target, Some(id("ghost")));
        assert_eq!(entries[2].phase, RoutingPhase::Error);
    }

    #[tokio::test]
    async fn test_route_dispatch_failure_is_folded() {
        let mut responder = MockLocalResponder::new();
        responder.expect_respond().times(0);
        let (router, sink) = router_with(responder);
        router
            .directory()
            .register("alpha", "http://127.0.0.1:1/a2a", None, None)
            .await
            .expect("register");

        let reply = router
            .route(&InboundMessage::new("@alpha hi", "conv-5"), RoutingMode::Permissive)
            .await
            .expect("reply");

        assert!(reply.envelope.text().starts_with("Error contacting agent @alpha"));
        assert!(matches!(reply.outcome, RouteOutcome::DispatchFailed { .. }));
        assert_eq!(
            phases(&sink, "conv-5"),
            vec![RoutingPhase::Incoming, RoutingPhase::Routing, RoutingPhase::Error]
        );
    }
}
