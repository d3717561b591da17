//! A2A (Agent-to-Agent) routing and discovery.
//!
//! - Mention parsing (`@agent-id` tokens in free text)
//! - Agent directory (bulk fetch at startup + manual registration)
//! - Router (local-vs-forward decision and execution)
//! - Remote dispatcher (at-most-once forwarding with a bounded timeout)
//! - Self-description (`.well-known/agent.json`, `/agentfacts`)
//! - Routing log (append-only record of every decision)
//! - HTTP gateway server (axum)

pub mod agent_card;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod mention;
pub mod router;
pub mod routing_log;
pub mod server;
pub mod types;

pub use directory::AgentDirectory;
pub use dispatcher::RemoteDispatcher;
pub use router::{Router, RoutingMode};
pub use routing_log::RoutingLog;
pub use server::start_server;
