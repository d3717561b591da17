//! Append-only routing log.
//!
//! Every inbound message produces an `Incoming` entry, one decision entry
//! (`Routing` or `Processing`) and one outcome entry (`Success` or `Error`),
//! all carrying the caller's conversation id. Entries fan out to any number
//! of sinks. Recording never fails from the router's point of view: a sink
//! error is reported through `tracing` and dropped.

use crate::a2a::types::AgentIdentifier;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

const SUMMARY_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPhase {
    Incoming,
    Routing,
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingLogEntry {
    pub timestamp: DateTime<Utc>,
    pub conversation_id: String,
    pub phase: RoutingPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<AgentIdentifier>,
    pub payload_summary: String,
}

impl RoutingLogEntry {
    pub fn new(
        conversation_id: &str,
        phase: RoutingPhase,
        target: Option<&AgentIdentifier>,
        payload: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            conversation_id: conversation_id.to_string(),
            phase,
            target: target.cloned(),
            payload_summary: summarize(payload),
        }
    }
}

/// Truncate to a fixed number of characters, marking the cut.
pub fn summarize(payload: &str) -> String {
    let mut chars = payload.chars();
    let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// An append destination for routing entries.
pub trait RoutingLogSink: Send + Sync {
    fn append(&self, entry: &RoutingLogEntry) -> io::Result<()>;
}

/// Emits entries as structured `tracing` events under `a2a::routing`.
pub struct TracingSink;

impl RoutingLogSink for TracingSink {
    fn append(&self, entry: &RoutingLogEntry) -> io::Result<()> {
        tracing::info!(
            target: "a2a::routing",
            conversation_id = %entry.conversation_id,
            phase = ?entry.phase,
            target_agent = entry.target.as_ref().map(AgentIdentifier::as_str),
            payload = %entry.payload_summary,
            "routing"
        );
        Ok(())
    }
}

/// JSON-lines file, written off-thread through a non-blocking appender.
pub struct FileSink {
    writer: NonBlocking,
    _guard: WorkerGuard,
}

impl FileSink {
    pub fn open(path: &Path) -> io::Result<Self> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "missing file name"))?;
        std::fs::create_dir_all(dir)?;

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(dir)
            .map_err(io::Error::other)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        Ok(Self {
            writer,
            _guard: guard,
        })
    }
}

impl RoutingLogSink for FileSink {
    fn append(&self, entry: &RoutingLogEntry) -> io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        self.writer.clone().write_all(&line)
    }
}

/// Keeps entries in memory. Useful for inspection in tests.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<RoutingLogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RoutingLogEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Entries for one conversation, in append order.
    pub fn for_conversation(&self, conversation_id: &str) -> Vec<RoutingLogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.conversation_id == conversation_id)
            .collect()
    }
}

impl RoutingLogSink for MemorySink {
    fn append(&self, entry: &RoutingLogEntry) -> io::Result<()> {
        self.entries
            .lock()
            .map_err(|_| io::Error::other("memory sink poisoned"))?
            .push(entry.clone());
        Ok(())
    }
}

/// Fan-out handle shared by every request.
#[derive(Clone, Default)]
pub struct RoutingLog {
    sinks: Arc<Vec<Arc<dyn RoutingLogSink>>>,
}

impl RoutingLog {
    pub fn new(sinks: Vec<Arc<dyn RoutingLogSink>>) -> Self {
        Self {
            sinks: Arc::new(sinks),
        }
    }

    /// Fire-and-forget append.
    pub fn record(&self, entry: RoutingLogEntry) {
        for sink in self.sinks.iter() {
            if let Err(e) = sink.append(&entry) {
                tracing::warn!(
                    error = %e,
                    conversation_id = %entry.conversation_id,
                    "Routing log sink failed"
                );
            }
        }
    }

    pub fn phase(
        &self,
        conversation_id: &str,
        phase: RoutingPhase,
        target: Option<&AgentIdentifier>,
        payload: &str,
    ) {
        self.record(RoutingLogEntry::new(conversation_id, phase, target, payload));
    }
}
