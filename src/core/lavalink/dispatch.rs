//! Dispatch loop: reads frames from the node and routes them to handlers.
//!
//! One loop runs per connected session as its own tokio task. Per frame:
//!
//! 1. Read the next frame. End of stream, or a read error saying the socket
//!    is closed or was reset without a close handshake, means the peer is
//!    gone: warn, release the session and stop. Any other read error is
//!    logged and the loop goes on.
//! 2. Non-text frames are skipped.
//! 3. Decode the [`Envelope`]; a frame without a string `op` is logged and dropped.
//! 4. Look up `op` in the registry. No handler is a debug line, not an error.
//!    A handler failure is logged and never stops the loop.
//!
//! Handlers are awaited inline, so a slow handler delays every later frame.
//! Nothing is reported back to the caller except through the log sink and
//! the [`DispatchReport`] the loop returns when it ends.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::task::{JoinError, JoinHandle};
use tokio_tungstenite::tungstenite::{self, Message, error::ProtocolError};
use tokio_util::sync::CancellationToken;

use super::handlers::MessageHandlers;
use super::messages::{Envelope, ReadyMessage, op};
use super::state::{SessionState, WsWriter};
use crate::logging::LogSink;

/// Why a dispatch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The transport closed, by the peer or after `disconnect`
    PeerClosed,
    /// [`DispatchHandle::cancel`] was called
    Cancelled,
    /// The registry was empty; no frame was read
    NoHandlers,
}

/// Counters kept by a dispatch loop over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Frames read from the transport, any type
    pub frames: u64,
    /// Handler invocations, successful or not
    pub dispatched: u64,
    /// Text frames whose operation had no handler
    pub unhandled: u64,
    /// Text frames without a decodable envelope
    pub decode_errors: u64,
    /// Handler invocations that returned an error
    pub handler_errors: u64,
    /// Transport read errors that did not end the loop
    pub read_errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub exit: LoopExit,
    pub stats: DispatchStats,
}

/// Handle to a running dispatch loop, returned by `connect`.
///
/// Dropping the handle detaches the loop; it keeps running until the
/// transport closes.
#[derive(Debug)]
pub struct DispatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<DispatchReport>,
}

impl DispatchHandle {
    pub(crate) fn new(cancel: CancellationToken, task: JoinHandle<DispatchReport>) -> Self {
        Self { cancel, task }
    }

    /// Stop the loop at its next suspension point.
    ///
    /// The connection is dropped without a close handshake; use
    /// `disconnect` for a graceful close.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to stop.
    pub async fn join(self) -> Result<DispatchReport, JoinError> {
        self.task.await
    }
}

/// Everything a loop needs besides its read half.
pub(crate) struct DispatchContext<W = WsWriter> {
    pub handlers: Arc<MessageHandlers>,
    pub log: Arc<dyn LogSink>,
    pub session: Arc<SessionState<W>>,
    pub epoch: u64,
    pub cancel: CancellationToken,
}

pub(crate) async fn run<S, W>(mut reader: S, ctx: DispatchContext<W>) -> DispatchReport
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut stats = DispatchStats::default();

    if ctx.handlers.is_empty() {
        ctx.log
            .warn("client: no handlers registered, dispatch loop will not start");
        return DispatchReport {
            exit: LoopExit::NoHandlers,
            stats,
        };
    }

    let exit = loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                ctx.log.info("client: dispatch loop cancelled, dropping connection");
                ctx.session.release(ctx.epoch);
                break LoopExit::Cancelled;
            }
            next = reader.next() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) if is_closed(&e) => {
                ctx.log
                    .warn(&format!("client: connection closed ({e}), stopping dispatch loop"));
                ctx.session.release(ctx.epoch);
                break LoopExit::PeerClosed;
            }
            Some(Err(e)) => {
                stats.read_errors += 1;
                ctx.log
                    .error(&format!("client: error on read message: {e}"));
                continue;
            }
            None => {
                ctx.log
                    .warn("client: connection closed, stopping dispatch loop");
                ctx.session.release(ctx.epoch);
                break LoopExit::PeerClosed;
            }
        };

        stats.frames += 1;

        let payload = match message {
            Message::Text(text) => Bytes::from(text),
            Message::Close(frame) => {
                ctx.log
                    .debug(&format!("client: close frame received: {frame:?}"));
                continue;
            }
            _ => continue,
        };

        dispatch_frame(&ctx, &mut stats, payload).await;
    };

    DispatchReport { exit, stats }
}

/// Read errors that mean the transport is gone rather than a bad frame.
fn is_closed(error: &tungstenite::Error) -> bool {
    matches!(
        error,
        tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

async fn dispatch_frame<W>(ctx: &DispatchContext<W>, stats: &mut DispatchStats, payload: Bytes) {
    let envelope = match Envelope::parse(&payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            stats.decode_errors += 1;
            ctx.log
                .error(&format!("client: error on decode message envelope: {e}"));
            return;
        }
    };
    let operation = envelope.operation;

    if operation == op::READY {
        match serde_json::from_slice::<ReadyMessage>(&payload) {
            Ok(ready) => ctx.session.set_session_id(ctx.epoch, ready.session_id),
            Err(e) => ctx
                .log
                .warn(&format!("client: ready message without session id: {e}")),
        }
    }

    let Some(handler) = ctx.handlers.get(&operation) else {
        stats.unhandled += 1;
        ctx.log
            .debug(&format!("client: no handler for operation \"{operation}\""));
        return;
    };

    stats.dispatched += 1;
    match handler(payload).await {
        Ok(()) => ctx
            .log
            .debug(&format!("client: operation \"{operation}\" handled")),
        Err(e) => {
            stats.handler_errors += 1;
            ctx.log
                .error(&format!("client: error on handle operation \"{operation}\": {e}"));
        }
    }
}
