//! Self-description documents.
//!
//! Both documents are pure functions of configuration plus the resolved
//! public base URL, so they are built once at startup and served as-is:
//! - `AgentCard` — `GET /.well-known/agent.json`
//! - `AgentFacts` — `GET /agentfacts`, NANDA-style discovery record

use crate::config::AgentConfig;
use serde::{Deserialize, Serialize};

/// Resolve the base URL other agents should use to reach us.
///
/// Precedence: explicit configuration, then the deployment-provided public
/// host (served over https), then `http://localhost:<port>`.
pub fn resolve_public_base_url(
    explicit: Option<&str>,
    deployment_host: Option<&str>,
    port: u16,
) -> String {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }
    match deployment_host.map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
            host.trim_end_matches('/').to_string()
        }
        Some(host) => format!("https://{}", host.trim_end_matches('/')),
        None => format!("http://localhost:{port}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCard {
    pub identifier: String,
    pub display_name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub inbound_endpoint: String,
    pub version: String,
}

/// Build the card for this instance.
pub fn describe(agent: &AgentConfig, base_url: &str, inbound_path: &str) -> AgentCard {
    AgentCard {
        identifier: agent.id.to_ascii_lowercase(),
        display_name: agent.name.clone(),
        description: agent.description.clone(),
        capabilities: agent.capabilities.clone(),
        inbound_endpoint: format!("{base_url}{inbound_path}"),
        version: crate::VERSION.to_string(),
    }
}

// ─── AgentFacts ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFacts {
    pub id: String,
    pub agent_name: String,
    pub label: String,
    pub description: String,
    pub version: String,
    pub provider: FactsProvider,
    pub jurisdiction: String,
    pub endpoints: FactsEndpoints,
    pub capabilities: FactsCapabilities,
    pub skills: Vec<FactsSkill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactsProvider {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactsEndpoints {
    #[serde(rename = "static")]
    pub static_endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactsCapabilities {
    pub modalities: Vec<String>,
    pub streaming: bool,
    pub batch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactsSkill {
    pub id: String,
    pub description: String,
    pub input_modes: Vec<String>,
    pub output_modes: Vec<String>,
}

/// Build the AgentFacts record from the same inputs as the card.
pub fn agent_facts(agent: &AgentConfig, card: &AgentCard) -> AgentFacts {
    let text = || vec!["text".to_string()];
    AgentFacts {
        id: card.identifier.clone(),
        agent_name: format!("urn:agent:{}:{}", agent.provider, card.identifier),
        label: card.display_name.clone(),
        description: card.description.clone(),
        version: card.version.clone(),
        provider: FactsProvider {
            name: agent.provider.clone(),
            url: agent.provider_url.clone(),
        },
        jurisdiction: agent.jurisdiction.clone(),
        endpoints: FactsEndpoints {
            static_endpoints: vec![card.inbound_endpoint.clone()],
        },
        capabilities: FactsCapabilities {
            modalities: text(),
            streaming: false,
            batch: false,
        },
        skills: card
            .capabilities
            .iter()
            .map(|cap| FactsSkill {
                id: cap.clone(),
                description: cap.replace(['-', '_'], " "),
                input_modes: text(),
                output_modes: text(),
            })
            .collect(),
    }
}
