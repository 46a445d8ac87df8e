//! WebSocket message types for the Lavalink v4 protocol.
//!
//! Every text frame the node sends is a JSON object with an `op` field. The
//! dispatch loop only decodes the [`Envelope`] to route a frame; handlers
//! decode the full payload themselves, typically into one of:
//!
//! - [`ReadyMessage`]: Session established, carries the session id
//! - [`PlayerUpdateMessage`]: Periodic player position/connection state
//! - [`StatsMessage`]: Node statistics (players, memory, cpu, frames)
//! - [`EventMessage`]: Player events (track start/end/exception/stuck,
//!   voice socket closed)

use serde::{Deserialize, Serialize};

/// Operation tags the node sends.
///
/// Tags are case-sensitive; register handlers with these exact strings.
pub mod op {
    pub const READY: &str = "ready";
    pub const PLAYER_UPDATE: &str = "playerUpdate";
    pub const STATS: &str = "stats";
    pub const EVENT: &str = "event";
}

// =============================================================================
// Envelope
// =============================================================================

/// Minimal shape extracted from every frame to route it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    #[serde(rename = "op")]
    pub operation: String,
}

impl Envelope {
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

// =============================================================================
// Incoming Messages (Node to Client)
// =============================================================================

/// Sent once the node accepted the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyMessage {
    /// Whether a previous session was resumed
    #[serde(default)]
    pub resumed: bool,
    /// Session id assigned by the node
    pub session_id: String,
}

/// Player state carried by `playerUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Unix timestamp in milliseconds
    pub time: u64,
    /// Track position in milliseconds
    #[serde(default)]
    pub position: u64,
    /// Whether the node is connected to the voice gateway
    pub connected: bool,
    /// Voice gateway ping in milliseconds, -1 when not connected
    pub ping: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdateMessage {
    pub guild_id: String,
    pub state: PlayerState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub free: u64,
    pub used: u64,
    pub allocated: u64,
    pub reservable: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cpu {
    pub cores: u32,
    pub system_load: f64,
    pub lavalink_load: f64,
}

/// Audio frame counters for the last minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub sent: i64,
    pub nulled: i64,
    /// Missing frames; can be negative when the node sent extra frames
    pub deficit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsMessage {
    pub players: u32,
    pub playing_players: u32,
    /// Node uptime in milliseconds
    pub uptime: u64,
    pub memory: Memory,
    pub cpu: Cpu,
    /// Absent when no players are active
    #[serde(default)]
    pub frame_stats: Option<FrameStats>,
}

/// Track metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub is_seekable: bool,
    pub author: String,
    /// Length in milliseconds
    pub length: u64,
    pub is_stream: bool,
    pub position: u64,
    pub title: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub isrc: Option<String>,
    pub source_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Base64-encoded track, opaque to the client
    pub encoded: String,
    pub info: TrackInfo,
    #[serde(default)]
    pub plugin_info: serde_json::Value,
    #[serde(default)]
    pub user_data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

impl TrackEndReason {
    /// Whether a player should start the next queued track.
    pub fn may_start_next(self) -> bool {
        matches!(self, TrackEndReason::Finished | TrackEndReason::LoadFailed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Common,
    Suspicious,
    Fault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackException {
    #[serde(default)]
    pub message: Option<String>,
    pub severity: Severity,
    pub cause: String,
    #[serde(default)]
    pub cause_stack_trace: Option<String>,
}

/// Player event carried by the `event` operation, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    TrackStartEvent {
        track: Track,
    },
    TrackEndEvent {
        track: Track,
        reason: TrackEndReason,
    },
    TrackExceptionEvent {
        track: Track,
        exception: TrackException,
    },
    #[serde(rename_all = "camelCase")]
    TrackStuckEvent {
        track: Track,
        threshold_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    WebSocketClosedEvent {
        code: u16,
        reason: String,
        by_remote: bool,
    },
    /// Event types added by newer nodes or plugins
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub guild_id: String,
    #[serde(flatten)]
    pub event: PlayerEvent,
}
