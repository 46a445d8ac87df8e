//! Connection state shared between the client and its dispatch loop.
//!
//! All transitions go through one `parking_lot::Mutex`; the lock is never held
//! across an `.await`. Each successful connect bumps an epoch so a dispatch
//! loop that outlives its session cannot tear down a newer one.

use std::fmt;

use futures_util::stream::SplitSink;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::error::{ClientError, ClientResult};

/// Write half of a live node connection.
pub(crate) type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Lifecycle of one logical session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

struct Inner<W> {
    state: ConnectionState,
    epoch: u64,
    /// Present iff `state == Connected`
    writer: Option<W>,
    session_id: Option<String>,
}

pub(crate) struct SessionState<W = WsWriter> {
    inner: Mutex<Inner<W>>,
}

impl<W> Default for SessionState<W> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                epoch: 0,
                writer: None,
                session_id: None,
            }),
        }
    }
}

impl<W> SessionState<W> {
    pub(crate) fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        self.inner.lock().session_id.clone()
    }

    /// Disconnected -> Connecting.
    pub(crate) fn begin_connect(&self) -> ClientResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != ConnectionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        inner.state = ConnectionState::Connecting;
        Ok(())
    }

    /// Connecting -> Disconnected, after a failed or abandoned dial.
    pub(crate) fn abort_connect(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Connecting {
            inner.state = ConnectionState::Disconnected;
        }
    }

    /// Connecting -> Connected. Returns the epoch owned by the new session.
    pub(crate) fn finish_connect(&self, writer: W) -> u64 {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.state = ConnectionState::Connected;
        inner.writer = Some(writer);
        inner.session_id = None;
        inner.epoch
    }

    /// Connected -> Disconnected on caller request; hands back the writer to close.
    pub(crate) fn take_writer(&self) -> Option<W> {
        let mut inner = self.inner.lock();
        let writer = inner.writer.take()?;
        inner.state = ConnectionState::Disconnected;
        Some(writer)
    }

    /// Connected -> Disconnected when the loop of `epoch` stops.
    ///
    /// Returns false if the session was already released or replaced.
    pub(crate) fn release(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || inner.state != ConnectionState::Connected {
            return false;
        }
        inner.state = ConnectionState::Disconnected;
        inner.writer = None;
        true
    }

    pub(crate) fn set_session_id(&self, epoch: u64, session_id: String) {
        let mut inner = self.inner.lock();
        if inner.epoch == epoch {
            inner.session_id = Some(session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestState = SessionState<&'static str>;

    #[test]
    fn test_connect_transitions() {
        let state = TestState::default();
        assert_eq!(state.state(), ConnectionState::Disconnected);

        state.begin_connect().unwrap();
        assert_eq!(state.state(), ConnectionState::Connecting);
        assert!(matches!(
            state.begin_connect(),
            Err(ClientError::AlreadyConnected)
        ));

        let epoch = state.finish_connect("writer");
        assert_eq!(epoch, 1);
        assert_eq!(state.state(), ConnectionState::Connected);
        assert!(matches!(
            state.begin_connect(),
            Err(ClientError::AlreadyConnected)
        ));
    }

    #[test]
    fn test_abort_only_from_connecting() {
        let state = TestState::default();
        state.begin_connect().unwrap();
        state.abort_connect();
        assert_eq!(state.state(), ConnectionState::Disconnected);

        state.begin_connect().unwrap();
        state.finish_connect("writer");
        state.abort_connect();
        assert_eq!(state.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_take_writer_disconnects_once() {
        let state = TestState::default();
        assert!(state.take_writer().is_none());

        state.begin_connect().unwrap();
        state.finish_connect("writer");
        assert_eq!(state.take_writer(), Some("writer"));
        assert_eq!(state.state(), ConnectionState::Disconnected);
        assert!(state.take_writer().is_none());
    }

    #[test]
    fn test_stale_epoch_cannot_release_newer_session() {
        let state = TestState::default();
        state.begin_connect().unwrap();
        let old = state.finish_connect("first");
        state.take_writer();

        state.begin_connect().unwrap();
        let new = state.finish_connect("second");
        assert_ne!(old, new);

        assert!(!state.release(old));
        assert_eq!(state.state(), ConnectionState::Connected);
        assert!(state.release(new));
        assert_eq!(state.state(), ConnectionState::Disconnected);
        assert!(!state.release(new));
    }

    #[test]
    fn test_session_id_scoped_to_epoch() {
        let state = TestState::default();
        state.begin_connect().unwrap();
        let first = state.finish_connect("first");
        state.set_session_id(first, "abc".into());
        assert_eq!(state.session_id().as_deref(), Some("abc"));

        state.release(first);
        assert_eq!(state.session_id().as_deref(), Some("abc"));

        state.begin_connect().unwrap();
        let second = state.finish_connect("second");
        assert!(state.session_id().is_none());
        state.set_session_id(first, "stale".into());
        assert!(state.session_id().is_none());
        state.set_session_id(second, "def".into());
        assert_eq!(state.session_id().as_deref(), Some("def"));
    }
}
