//! Lavalink WebSocket client implementation.
//!
//! This module contains the `LavalinkClient` that owns one logical session
//! with a node: dial and authenticate, hold the live transport, close.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  handshake   ┌──────────────┐
//! │  connect()  │─────────────▶│ Lavalink node│
//! └──────┬──────┘              └──────┬───────┘
//!        │ split                      │ text frames
//!        ▼                            ▼
//! ┌─────────────┐              ┌──────────────┐      ┌──────────┐
//! │ SessionState│◀──release────│ dispatch loop│─────▶│ handlers │
//! │ (write half)│              │  (read half) │      └──────────┘
//! └──────┬──────┘              └──────────────┘
//!        │ close
//! ┌──────┴──────┐
//! │ disconnect()│
//! └─────────────┘
//! ```
//!
//! The write half lives in the shared session state so `disconnect` can
//! close it; the read half is owned by the dispatch loop task.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest, handshake::client::Request};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::dispatch::{self, DispatchContext, DispatchHandle};
use super::error::{ClientError, ClientResult};
use super::handlers::MessageHandlers;
use super::state::{ConnectionState, SessionState};
use crate::config::ClientConfig;
use crate::logging::LogSink;

const USER_ID: HeaderName = HeaderName::from_static("user-id");
const CLIENT_NAME: HeaderName = HeaderName::from_static("client-name");

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`LavalinkClient`]. Performs no I/O.
pub struct ClientBuilder {
    config: ClientConfig,
    handlers: MessageHandlers,
    log: Option<Arc<dyn LogSink>>,
}

impl ClientBuilder {
    pub fn handlers(mut self, handlers: MessageHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Validate the config and build the client.
    ///
    /// # Errors
    /// Any [`ClientConfig::validate`] error, then
    /// [`ClientError::MissingLogSink`] if no sink was given.
    pub fn build(self) -> ClientResult<LavalinkClient> {
        self.config.validate()?;
        let log = self.log.ok_or(ClientError::MissingLogSink)?;

        Ok(LavalinkClient {
            config: self.config,
            handlers: Arc::new(self.handlers),
            log,
            session: Arc::new(SessionState::default()),
        })
    }
}

// =============================================================================
// LavalinkClient
// =============================================================================

/// Client for one Lavalink node session.
///
/// `connect` and `disconnect` take `&self`; state transitions are guarded
/// internally, so the client can be shared behind an `Arc`.
pub struct LavalinkClient {
    config: ClientConfig,
    handlers: Arc<MessageHandlers>,
    log: Arc<dyn LogSink>,
    session: Arc<SessionState>,
}

/// Puts the session back to `Disconnected` if a dial fails or its future is
/// dropped before completing.
struct ConnectGuard<'a> {
    session: &'a SessionState,
    armed: bool,
}

impl<'a> ConnectGuard<'a> {
    fn new(session: &'a SessionState) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abort_connect();
        }
    }
}

impl LavalinkClient {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            handlers: MessageHandlers::empty(),
            log: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn handlers(&self) -> &MessageHandlers {
        &self.handlers
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Session id from the node's last `ready` message on the current or most
    /// recent connection.
    pub fn session_id(&self) -> Option<String> {
        self.session.session_id()
    }

    /// Dial the node, authenticate, and start the dispatch loop.
    ///
    /// Returns once the handshake is accepted; the loop runs in the
    /// background. The dial is bounded by the configured handshake timeout,
    /// and dropping this future abandons it.
    ///
    /// # Errors
    /// - [`ClientError::AlreadyConnected`] unless the client is disconnected
    /// - [`ClientError::InvalidPassword`] on a 401/403 handshake response
    /// - [`ClientError::InvalidHost`] on a 404 handshake response
    /// - [`ClientError::HandshakeRejected`] on any other non-101 response
    /// - [`ClientError::HandshakeTimeout`] if the deadline passes
    /// - [`ClientError::Dial`] for transport failures
    pub async fn connect(&self) -> ClientResult<DispatchHandle> {
        let request = self.handshake_request()?;

        self.session.begin_connect()?;
        let guard = ConnectGuard::new(&self.session);

        info!(
            host = %self.config.host,
            tls = self.config.tls,
            "Connecting to Lavalink node"
        );

        let stream = match timeout(self.config.handshake_timeout, connect_async(request)).await {
            Ok(Ok((stream, response))) => {
                debug!(status = %response.status(), "Lavalink handshake accepted");
                stream
            }
            Ok(Err(e)) => return Err(self.classify_dial_error(e)),
            Err(_) => {
                self.log.warn(&format!(
                    "client: handshake with {} timed out after {:?}",
                    self.config.host, self.config.handshake_timeout
                ));
                return Err(ClientError::HandshakeTimeout(self.config.handshake_timeout));
            }
        };

        let (writer, reader) = stream.split();
        let epoch = self.session.finish_connect(writer);
        guard.disarm();

        let cancel = CancellationToken::new();
        let ctx = DispatchContext {
            handlers: self.handlers.clone(),
            log: self.log.clone(),
            session: self.session.clone(),
            epoch,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(dispatch::run(reader, ctx));

        info!(host = %self.config.host, "Connected to Lavalink node");
        Ok(DispatchHandle::new(cancel, task))
    }

    /// Close the live transport.
    ///
    /// The client is `Disconnected` as soon as this returns. The dispatch
    /// loop stops on its own once it reads the closure, which may be after
    /// this returns; await [`DispatchHandle::join`] to observe it.
    ///
    /// # Errors
    /// - [`ClientError::NotConnected`] if there is no live transport
    /// - [`ClientError::Close`] if sending the close frame fails
    pub async fn disconnect(&self) -> ClientResult<()> {
        let mut writer = self
            .session
            .take_writer()
            .ok_or(ClientError::NotConnected)?;

        info!(host = %self.config.host, "Disconnecting from Lavalink node");
        writer.close().await.map_err(ClientError::Close)
    }

    fn handshake_request(&self) -> ClientResult<Request> {
        let url = self.config.websocket_url()?;
        let mut request = url.as_str().into_client_request().map_err(ClientError::Dial)?;

        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            header_value("authorization", &self.config.password)?,
        );
        headers.insert(USER_ID, header_value("user-id", &self.config.user_id)?);
        headers.insert(
            CLIENT_NAME,
            header_value("client-name", &self.config.client_name)?,
        );

        Ok(request)
    }

    fn classify_dial_error(&self, error: tungstenite::Error) -> ClientError {
        match error {
            tungstenite::Error::Http(response) => {
                let status = response.status().as_u16();
                self.log.warn(&format!(
                    "client: {} rejected the handshake with status {status}",
                    self.config.host
                ));
                match status {
                    401 | 403 => ClientError::InvalidPassword,
                    404 => ClientError::InvalidHost(self.config.host.clone()),
                    _ => ClientError::HandshakeRejected(status),
                }
            }
            other => {
                self.log.warn(&format!(
                    "client: failed to dial {}: {other}",
                    self.config.host
                ));
                ClientError::Dial(other)
            }
        }
    }
}

fn header_value(name: &'static str, value: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader(name))
}
