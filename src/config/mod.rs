//! Configuration
//!
//! Layered with the `config` crate, lowest precedence first:
//! 1. Compiled-in defaults (`#[serde(default)]` on every section)
//! 2. TOML file (`~/.agent-relay/config.toml`, or `--config <path>`)
//! 3. Environment, `AGENT_RELAY_<SECTION>__<KEY>` (e.g. `AGENT_RELAY_GATEWAY__PORT`)
//!
//! CLI flags are applied on top by `main`.

use crate::a2a::dispatcher::DEFAULT_TIMEOUT_SECS;
use crate::a2a::router::RoutingMode;
use crate::a2a::types::AgentIdentifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ENV_PREFIX: &str = "AGENT_RELAY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub gateway: GatewayConfig,
    pub directory: DirectoryConfig,
    pub dispatch: DispatchConfig,
    pub routing: RoutingConfig,
    pub routing_log: RoutingLogConfig,
    pub responder: ResponderConfig,
}

/// Static identity published through the self-description endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
    /// Username under which the central directory lists this agent.
    pub username: Option<String>,
    pub description: String,
    pub capabilities: Vec<String>,
    pub provider: String,
    pub provider_url: Option<String>,
    pub jurisdiction: String,
    /// Explicit public base URL. Wins over the deployment host.
    pub public_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: "agent-relay".to_string(),
            name: "Agent Relay".to_string(),
            username: None,
            description: "Answers questions and relays @mentions to peer agents.".to_string(),
            capabilities: vec![
                "question-answering".to_string(),
                "agent-routing".to_string(),
            ],
            provider: "agent-relay".to_string(),
            provider_url: None,
            jurisdiction: "global".to_string(),
            public_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Central directory listing; discovery is manual-only when unset.
    pub registry_url: Option<String>,
    /// Path appended to each listed agent URL to reach its inbound endpoint.
    pub inbound_path: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            registry_url: None,
            inbound_path: "/a2a".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Mode of `POST /a2a`. `POST /a2a/strict` is always strict.
    pub mode: RoutingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingLogConfig {
    /// Optional JSON-lines file receiving every routing entry.
    pub path: Option<PathBuf>,
    /// Mirror entries as `tracing` events.
    pub tracing: bool,
}

impl Default for RoutingLogConfig {
    fn default() -> Self {
        Self {
            path: None,
            tracing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            system_prompt: "You are a helpful agent. Answer clearly and concisely.".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ResponderConfig {
    /// Configured key, falling back to `OPENAI_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// `~/.agent-relay/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".agent-relay")
        .join("config.toml")
}

impl Config {
    /// Load from file + environment. An explicit `path` must exist; the
    /// default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::from(default_config_path()).required(false),
        };

        let cfg: Config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        AgentIdentifier::parse(&self.agent.id)
            .map_err(|e| ConfigError::Invalid(format!("agent.id: {e}")))?;
        if self.dispatch.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !self.directory.inbound_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "directory.inbound_path must start with '/'".to_string(),
            ));
        }
        Ok(())
    }
}
