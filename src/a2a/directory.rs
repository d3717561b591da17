//! In-process directory of known peer agents.
//!
//! Two independent write paths feed the same registry: a bulk fetch from the
//! central directory at startup, and ad-hoc single registrations. Writes take
//! the write half of an `RwLock`; lookups share the read half and clone the
//! record out, so no lock is ever held across a forward.

use crate::a2a::error::{DirectoryFetchError, ValidationError};
use crate::a2a::types::{AgentIdentifier, AgentRecord, DirectoryEntry};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared, explicitly constructed agent registry.
#[derive(Clone, Default)]
pub struct AgentDirectory {
    agents: Arc<RwLock<HashMap<AgentIdentifier, AgentRecord>>>,
}

impl AgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of records. Existing identifiers are overwritten.
    pub async fn bulk_load(&self, records: Vec<AgentRecord>) -> usize {
        let mut agents = self.agents.write().await;
        for record in records {
            agents.insert(record.identifier.clone(), record);
        }
        agents.len()
    }

    /// Validate and upsert a single agent.
    pub async fn register(
        &self,
        identifier: &str,
        endpoint: &str,
        display_name: Option<String>,
        description: Option<String>,
    ) -> Result<AgentRecord, ValidationError> {
        let identifier = AgentIdentifier::parse(identifier)?;
        let inbound_endpoint = validate_endpoint(endpoint)?;
        let record = AgentRecord {
            display_name: display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| identifier.to_string()),
            identifier,
            inbound_endpoint,
            description: description.unwrap_or_default(),
        };

        let mut agents = self.agents.write().await;
        let replaced = agents
            .insert(record.identifier.clone(), record.clone())
            .is_some();
        tracing::info!(
            agent = %record.identifier,
            endpoint = %record.inbound_endpoint,
            replaced,
            "A2A: Registered agent"
        );
        Ok(record)
    }

    /// Exact match on the normalized identifier.
    pub async fn lookup(&self, identifier: &AgentIdentifier) -> Option<AgentRecord> {
        self.agents.read().await.get(identifier).cloned()
    }

    /// Snapshot of every known agent.
    pub async fn list(&self) -> Vec<AgentRecord> {
        self.agents.read().await.values().cloned().collect()
    }

    /// Known identifiers, sorted for stable display.
    pub async fn known_identifiers(&self) -> Vec<AgentIdentifier> {
        let mut ids: Vec<_> = self.agents.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }

    /// Startup discovery. Any failure leaves the directory as it was and is
    /// only logged, so the process still starts with manual registration.
    pub async fn load_from_registry(
        &self,
        client: &reqwest::Client,
        registry_url: &str,
        inbound_path: &str,
    ) -> usize {
        match fetch_directory(client, registry_url, inbound_path).await {
            Ok(records) => {
                let fetched = records.len();
                let total = self.bulk_load(records).await;
                tracing::info!(fetched, total, "A2A: Loaded agents from directory");
                total
            }
            Err(e) => {
                tracing::warn!(
                    registry = registry_url,
                    error = %e,
                    "A2A: Directory fetch failed, continuing with manual registration only"
                );
                self.len().await
            }
        }
    }
}

/// Accept only absolute `http`/`https` URLs with a host.
pub fn validate_endpoint(raw: &str) -> Result<String, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidEndpoint {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(url.to_string())
}

/// GET the central directory and turn each entry into a record.
///
/// Entries whose username or URL fail validation are skipped.
pub async fn fetch_directory(
    client: &reqwest::Client,
    registry_url: &str,
    inbound_path: &str,
) -> Result<Vec<AgentRecord>, DirectoryFetchError> {
    let resp = client.get(registry_url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DirectoryFetchError::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    let entries: Vec<DirectoryEntry> = serde_json::from_slice(&body)?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry_to_record(entry, inbound_path) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "A2A: Skipping directory entry");
                None
            }
        })
        .collect())
}

fn entry_to_record(
    entry: DirectoryEntry,
    inbound_path: &str,
) -> Result<AgentRecord, ValidationError> {
    let identifier = AgentIdentifier::parse(entry.username.trim())?;
    let endpoint = format!(
        "{}/{}",
        entry.url.trim().trim_end_matches('/'),
        inbound_path.trim_start_matches('/')
    );
    Ok(AgentRecord {
        display_name: entry.name.unwrap_or_else(|| identifier.to_string()),
        inbound_endpoint: validate_endpoint(&endpoint)?,
        description: entry.description.unwrap_or_default(),
        identifier,
    })
}
