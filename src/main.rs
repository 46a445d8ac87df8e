use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lavalink_client::{
    ClientConfig, EventMessage, LavalinkClient, MessageHandlers, PlayerEvent, PlayerUpdateMessage,
    ReadyMessage, StatsMessage, TracingLogSink, op,
};

/// Lavalink client - connects to a node and logs what it reports
#[derive(Parser, Debug)]
#[command(name = "lavalink-client")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bot user id, overrides the configured one
    #[arg(short = 'u', long = "user-id", value_name = "ID")]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let mut config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ClientConfig::from_file(&config_path)?
    } else {
        ClientConfig::from_env()?
    };
    if let Some(user_id) = cli.user_id {
        config.user_id = user_id;
    }

    let client = LavalinkClient::builder(config)
        .handlers(logging_handlers())
        .log_sink(TracingLogSink::shared())
        .build()?;

    let dispatch = client.connect().await?;
    let cancel = dispatch.cancellation_token();
    let mut join = tokio::spawn(dispatch.join());

    tokio::select! {
        result = &mut join => {
            let report = result??;
            warn!(exit = ?report.exit, stats = ?report.stats, "Dispatch loop stopped");
            return Ok(());
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = client.disconnect().await {
        warn!("Disconnect failed: {e}");
        cancel.cancel();
    }

    let report = join.await??;
    info!(exit = ?report.exit, stats = ?report.stats, "Dispatch loop stopped");
    Ok(())
}

fn logging_handlers() -> MessageHandlers {
    MessageHandlers::builder()
        .on_json(op::READY, |ready: ReadyMessage| async move {
            info!(
                session_id = %ready.session_id,
                resumed = ready.resumed,
                "Node session ready"
            );
            Ok(())
        })
        .on_json(op::PLAYER_UPDATE, |update: PlayerUpdateMessage| async move {
            info!(
                guild_id = %update.guild_id,
                position = update.state.position,
                connected = update.state.connected,
                ping = update.state.ping,
                "Player update"
            );
            Ok(())
        })
        .on_json(op::STATS, |stats: StatsMessage| async move {
            info!(
                players = stats.players,
                playing = stats.playing_players,
                uptime_ms = stats.uptime,
                memory_used = stats.memory.used,
                cpu_load = stats.cpu.lavalink_load,
                "Node stats"
            );
            Ok(())
        })
        .on_json(op::EVENT, |event: EventMessage| async move {
            match &event.event {
                PlayerEvent::TrackStartEvent { track } => {
                    info!(guild_id = %event.guild_id, title = %track.info.title, "Track started")
                }
                PlayerEvent::TrackEndEvent { track, reason } => info!(
                    guild_id = %event.guild_id,
                    title = %track.info.title,
                    ?reason,
                    "Track ended"
                ),
                PlayerEvent::TrackExceptionEvent { track, exception } => warn!(
                    guild_id = %event.guild_id,
                    title = %track.info.title,
                    severity = ?exception.severity,
                    cause = %exception.cause,
                    "Track exception"
                ),
                PlayerEvent::TrackStuckEvent {
                    track,
                    threshold_ms,
                } => warn!(
                    guild_id = %event.guild_id,
                    title = %track.info.title,
                    threshold_ms,
                    "Track stuck"
                ),
                PlayerEvent::WebSocketClosedEvent {
                    code,
                    reason,
                    by_remote,
                } => warn!(
                    guild_id = %event.guild_id,
                    code,
                    reason = %reason,
                    by_remote,
                    "Voice WebSocket closed"
                ),
                PlayerEvent::Unknown => info!(guild_id = %event.guild_id, "Unknown player event"),
            }
            Ok(())
        })
        .build()
}
