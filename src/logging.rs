//! Log sink seam for the dispatch loop.
//!
//! The dispatch loop runs unattended in the background, so every outcome it
//! produces (decode failures, handler failures, peer closure) is reported
//! through a [`LogSink`] the caller hands to the client builder. Calls are
//! fire-and-forget; nothing is returned to the loop.
//!
//! [`TracingLogSink`] forwards to `tracing`, which is what the binary uses.
//! Severity filtering belongs to the subscriber (`RUST_LOG`), not the sink.

use std::sync::Arc;

/// Minimal logging interface consumed by the client.
pub trait LogSink: Send + Sync {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    fn debug(&self, msg: &str);
}

/// Forwards every call to the matching `tracing` macro.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl TracingLogSink {
    /// Convenience for builders that take a shared sink.
    pub fn shared() -> Arc<dyn LogSink> {
        Arc::new(Self)
    }
}

impl LogSink for TracingLogSink {
    fn info(&self, msg: &str) {
        tracing::info!(target: "lavalink_client", "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "lavalink_client", "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "lavalink_client", "{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!(target: "lavalink_client", "{msg}");
    }
}
