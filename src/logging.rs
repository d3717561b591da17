//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the level passed on the command line. Routing log
//! entries go through the same subscriber under the `a2a::routing` target,
//! so `RUST_LOG=a2a::routing=off` silences them without touching the
//! JSON-lines file sink.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Safe to call once per process.
pub fn init(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}
