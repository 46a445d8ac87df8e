//! Error types for the Lavalink client.

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors returned synchronously by client construction, `connect` and
/// `disconnect`.
///
/// Failures that happen inside the dispatch loop are never surfaced here;
/// they go to the log sink and the loop's [`DispatchStats`](super::DispatchStats).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Every identifying config field is empty
    #[error("client: config is empty")]
    EmptyConfig,

    /// Host does not match the domain-or-IPv4 grammar, or the node
    /// answered the handshake with 404
    #[error("client: invalid host: {0}")]
    InvalidHost(String),

    /// Client identity (user id) is empty
    #[error("client: user id is not set")]
    MissingIdentity,

    /// No log sink was supplied to the builder
    #[error("client: log sink is not set")]
    MissingLogSink,

    /// `connect` was called while connecting or connected
    #[error("client: connection already established")]
    AlreadyConnected,

    /// `disconnect` was called with no live transport
    #[error("client: connection not established")]
    NotConnected,

    /// The node rejected the handshake credentials (401/403)
    #[error("client: invalid password")]
    InvalidPassword,

    /// The node answered the handshake with an unmapped non-101 status
    #[error("client: handshake rejected with status {0}")]
    HandshakeRejected(u16),

    /// The handshake did not complete within the configured deadline
    #[error("client: handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// A handshake header value contains bytes HTTP cannot carry
    #[error("client: invalid value for header {0}")]
    InvalidHeader(&'static str),

    /// Transport-level dial failure, cause preserved
    #[error("client: dial failed: {0}")]
    Dial(#[source] tungstenite::Error),

    /// Closing the transport failed
    #[error("client: close failed: {0}")]
    Close(#[source] tungstenite::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Error type handlers report back to the dispatch loop.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

impl ClientError {
    /// Whether retrying the same call with the same config can succeed.
    ///
    /// Configuration and credential errors need a config change first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Dial(_) | ClientError::HandshakeTimeout(_) | ClientError::HandshakeRejected(_)
        )
    }
}
