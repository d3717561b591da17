//! Agent Relay
//!
//! Agent-to-Agent (A2A) message routing and discovery. An agent process
//! publishes its own self-description, discovers peers through a central
//! directory, answers plain messages locally and forwards `@peer` messages
//! to the named agent, recording every routing decision as it goes.

pub mod a2a;
pub mod config;
pub mod logging;
pub mod responder;

#[cfg(test)]
mod tests;

/// Crate version, surfaced in the self-description and health endpoints.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
