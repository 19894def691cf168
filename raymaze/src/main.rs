//! Raymaze Headless Client
//!
//! Drives a client session at 60 Hz with scripted input and procedural
//! assets. Connects to a relay when `RAYMAZE_SERVER_URL` is set.
//!
//! Environment:
//! - `RAYMAZE_TICKS`: frames to run (default 1800)
//! - `RAYMAZE_SEED`: maze seed (default random)
//! - `RAYMAZE_SERVER_URL`, `RAYMAZE_RECONNECT_ATTEMPTS`: see `ClientConfig`

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use raymaze::{
    game::{events::GameEventData, maze::DEFAULT_MAZE_SIZE},
    network::{client, ClientConfig, SyncConfig},
    render::NullAudio,
    AssetStore, ClientSession, DeterministicRng, GameState, InputFrame, NetworkSync, PlayerId, RenderConfig,
    SimConfig, TICK_RATE, VERSION,
};

/// Frames a dead player waits before restarting.
const RESPAWN_DELAY: u64 = 120;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Raymaze v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let ticks: u64 = env_parse("RAYMAZE_TICKS").unwrap_or(1800);
    let seed: u64 = env_parse("RAYMAZE_SEED").unwrap_or_else(|| DeterministicRng::from_entropy().next_u64());
    let player_id = PlayerId::generate();

    let state = GameState::generate(player_id.clone(), DEFAULT_MAZE_SIZE, DEFAULT_MAZE_SIZE, seed)
        .context("generating maze")?;
    info!(player = %player_id, seed, "maze generated\n{}", state.grid);

    let (sync, transport) = if std::env::var("RAYMAZE_SERVER_URL").is_ok() {
        let (sync, endpoints) = NetworkSync::channel(SyncConfig::default());
        let handle = client::spawn(ClientConfig::from_env(), player_id.clone(), endpoints);
        (sync, Some(handle))
    } else {
        info!("RAYMAZE_SERVER_URL not set, running offline");
        (NetworkSync::offline(), None)
    };

    let render = RenderConfig {
        width: 320,
        height: 200,
        minimap_size: 80,
        ..RenderConfig::default()
    };
    let mut session = ClientSession::new(
        state,
        SimConfig::default(),
        sync,
        render,
        AssetStore::procedural(),
        Box::new(NullAudio),
    );

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / TICK_RATE as f64));
    let mut last = Instant::now();
    let mut dead_since: Option<u64> = None;
    let mut kills = 0u32;

    info!("Running {} frames...", ticks);
    for t in 0..ticks {
        interval.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        let result = session.frame(&scripted_input(t), dt);

        for event in &result.events {
            match &event.data {
                GameEventData::MonsterKilled { kind, new_score } => {
                    kills += 1;
                    info!(?kind, score = new_score, "monster killed");
                }
                GameEventData::PlayerDied => info!(tick = t, "player died"),
                GameEventData::MapReplaced { width, height } => info!(width, height, "map replaced by peer"),
                _ => {}
            }
        }

        match dead_since {
            None if session.state().is_dead() => dead_since = Some(t),
            Some(since) if t - since >= RESPAWN_DELAY => {
                session.restart();
                dead_since = None;
            }
            _ => {}
        }

        if t > 0 && t % (TICK_RATE as u64 * 10) == 0 {
            let s = session.state();
            info!(
                "Frame {}: health {}, ammo {}, score {}, {} monsters, {} power-ups, {} peers, {:?}",
                t,
                s.player.health,
                s.player.ammo,
                s.player.score,
                s.monsters.len(),
                s.powerups.len(),
                s.remote_players.len(),
                session.sync().connection_state(),
            );
        }
    }

    let stats = session.stats().clone();
    info!("=== Session Results ===");
    info!("Frames: {}", stats.frames);
    info!("Kills: {}", kills);
    info!("Final score: {}", session.state().player.score);
    info!("Messages merged: {}", stats.messages_applied);
    info!("Snapshots sent: {}", stats.snapshots_sent);
    info!("Restarts: {}", stats.restarts);

    // Dropping the session closes the queues and stops the transport.
    drop(session);
    if let Some(handle) = transport {
        match tokio::time::timeout(Duration::from_secs(2), handle).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!("transport ended with error: {}", e),
            Ok(Err(e)) => warn!("transport task failed: {}", e),
            Err(_) => warn!("transport did not stop in time"),
        }
    }

    Ok(())
}

/// Walk forward, sweep right now and then, fire on a beat, cycle weapons rarely.
fn scripted_input(t: u64) -> InputFrame {
    let mut input = InputFrame::new().with(InputFrame::FLAG_FORWARD);
    if (t / 45) % 3 == 0 {
        input = input.with(InputFrame::FLAG_RIGHT);
    }
    if t % 20 == 0 {
        input = input.with(InputFrame::FLAG_FIRE);
    }
    if t % 900 == 899 {
        input = input.with(InputFrame::FLAG_SWITCH);
    }
    input
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}
