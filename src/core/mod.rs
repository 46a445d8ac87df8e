pub mod lavalink;

pub use lavalink::{
    ClientBuilder, ClientError, ClientResult, ConnectionState, DispatchHandle, DispatchReport,
    DispatchStats, EventMessage, HandlerError, LavalinkClient, LoopExit, MessageHandlers,
    PlayerEvent, PlayerUpdateMessage, ReadyMessage, StatsMessage, op,
};
