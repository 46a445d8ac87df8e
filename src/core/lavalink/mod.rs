//! Lavalink v4 node client.
//!
//! This module provides a client for a remote Lavalink audio node with:
//!
//! - Config validation before any I/O (host grammar, user id)
//! - Authenticated WebSocket handshake (`Authorization`, `User-Id`,
//!   `Client-Name` headers) against `/v4/websocket`
//! - An explicit `Disconnected`/`Connecting`/`Connected` state machine
//! - A background dispatch loop routing each frame's `op` to a handler
//!
//! # Architecture
//!
//! The module is organized into focused submodules:
//!
//! - [`client`]: `LavalinkClient` and its builder
//! - [`dispatch`]: The per-session read/dispatch loop and its handle
//! - [`handlers`]: The immutable handler registry
//! - [`messages`]: Envelope and typed payloads for the node's operations
//! - [`state`]: Connection state shared with the dispatch loop
//!
//! # Example
//!
//! ```rust,no_run
//! use lavalink_client::config::ClientConfig;
//! use lavalink_client::core::lavalink::{LavalinkClient, MessageHandlers, ReadyMessage, op};
//! use lavalink_client::logging::TracingLogSink;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("127.0.0.1:2333", "youshallnotpass", "123456789");
//!
//!     let handlers = MessageHandlers::builder()
//!         .on_json(op::READY, |ready: ReadyMessage| async move {
//!             println!("Session ready: {}", ready.session_id);
//!             Ok(())
//!         })
//!         .build();
//!
//!     let client = LavalinkClient::builder(config)
//!         .handlers(handlers)
//!         .log_sink(TracingLogSink::shared())
//!         .build()?;
//!
//!     let dispatch = client.connect().await?;
//!
//!     // ... later
//!     client.disconnect().await?;
//!     let report = dispatch.join().await?;
//!     println!("Dispatch loop stopped: {:?}", report.exit);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod dispatch;
mod error;
mod handlers;
mod messages;
mod state;


// Re-export public types
pub use client::{ClientBuilder, LavalinkClient};
pub use dispatch::{DispatchHandle, DispatchReport, DispatchStats, LoopExit};
pub use error::{ClientError, ClientResult, HandlerError};
pub use handlers::{HandlerFuture, MessageHandlerFunc, MessageHandlers, MessageHandlersBuilder};
pub use messages::{
    Cpu, Envelope, EventMessage, FrameStats, Memory, PlayerEvent, PlayerState,
    PlayerUpdateMessage, ReadyMessage, Severity, StatsMessage, Track, TrackEndReason,
    TrackException, TrackInfo, op,
};
pub use state::ConnectionState;
