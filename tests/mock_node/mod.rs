//! Mock Lavalink node for integration tests
//!
//! Accepts WebSocket connections on an ephemeral localhost port and, per
//! connection:
//! - Checks the path and `Authorization` header like a real node
//!   (404 on wrong path, 403 on wrong password)
//! - Optionally rejects every handshake with a fixed status
//! - Captures the handshake request headers for inspection
//! - Sends a scripted list of text frames, then closes, drops the socket
//!   without a close frame, or holds it open until the client closes it

// Not every test binary uses every helper
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use http::HeaderMap;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use lavalink_client::logging::LogSink;

pub const PASSWORD: &str = "youshallnotpass";

/// What the node does after sending its scripted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterFrames {
    /// Send a close frame
    Close,
    /// Keep the socket open until the client closes it
    Hold,
    /// Drop the TCP connection without a close frame
    Drop,
}

#[derive(Debug, Clone)]
pub struct NodeScript {
    pub password: String,
    pub path: String,
    pub reject_with: Option<u16>,
    pub frames: Vec<String>,
    pub after: AfterFrames,
}

impl Default for NodeScript {
    fn default() -> Self {
        Self {
            password: PASSWORD.to_string(),
            path: "/v4/websocket".to_string(),
            reject_with: None,
            frames: Vec::new(),
            after: AfterFrames::Hold,
        }
    }
}

impl NodeScript {
    pub fn frames(mut self, frames: &[&str]) -> Self {
        self.frames = frames.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn then(mut self, after: AfterFrames) -> Self {
        self.after = after;
        self
    }

    pub fn reject_with(mut self, status: u16) -> Self {
        self.reject_with = Some(status);
        self
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: HeaderMap,
}

#[derive(Default)]
struct Captured {
    count: AtomicUsize,
    last: Mutex<Option<CapturedRequest>>,
}

/// Serves every incoming connection with the same script until dropped.
pub struct MockNode {
    pub addr: SocketAddr,
    captured: Arc<Captured>,
    task: JoinHandle<()>,
}

impl MockNode {
    pub async fn spawn(script: NodeScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Captured::default());
        let captured_in_task = captured.clone();

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, script.clone(), captured_in_task.clone()));
            }
        });

        Self {
            addr,
            captured,
            task,
        }
    }

    /// Host string for `ClientConfig`, `127.0.0.1:<port>`.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Headers of the most recent handshake.
    pub fn captured(&self) -> Option<CapturedRequest> {
        self.captured.last.lock().clone()
    }

    /// Handshakes seen so far, accepted or not.
    pub fn handshakes(&self) -> usize {
        self.captured.count.load(Ordering::SeqCst)
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, script: NodeScript, captured: Arc<Captured>) {
    let NodeScript {
        password,
        path,
        reject_with,
        frames,
        after,
    } = script;

    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        captured.count.fetch_add(1, Ordering::SeqCst);
        *captured.last.lock() = Some(CapturedRequest {
            path: req.uri().path().to_string(),
            headers: req.headers().clone(),
        });

        if req.uri().path() != path {
            return Err(error_response(404));
        }
        let auth = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        if auth != Some(password.as_str()) {
            return Err(error_response(403));
        }
        if let Some(status) = reject_with {
            return Err(error_response(status));
        }
        Ok(resp)
    };

    let Ok(ws) = accept_hdr_async(stream, callback).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    for frame in frames {
        if write.send(Message::text(frame)).await.is_err() {
            return;
        }
    }

    match after {
        AfterFrames::Close => {
            let _ = write.send(Message::Close(None)).await;
        }
        AfterFrames::Hold => {}
        AfterFrames::Drop => return,
    }

    // Reading answers the client's close frame and drains until the socket
    // is gone.
    while let Some(Ok(_)) = read.next().await {}
}

fn error_response(status: u16) -> ErrorResponse {
    http::Response::builder()
        .status(status)
        .body(Some(format!("mock node rejected handshake with {status}")))
        .unwrap()
}

// =============================================================================
// Log capture
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self, level: Level) -> usize {
        self.lines.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines
            .lock()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn info(&self, msg: &str) {
        self.lines.lock().push((Level::Info, msg.to_string()));
    }

    fn warn(&self, msg: &str) {
        self.lines.lock().push((Level::Warn, msg.to_string()));
    }

    fn error(&self, msg: &str) {
        self.lines.lock().push((Level::Error, msg.to_string()));
    }

    fn debug(&self, msg: &str) {
        self.lines.lock().push((Level::Debug, msg.to_string()));
    }
}
