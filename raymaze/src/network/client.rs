//! WebSocket Client Transport
//!
//! Background task that owns the socket. Decoded inbound messages go into
//! the sync inbox; the sync outbox is written to the socket. Connection
//! changes are published on a `watch` channel and never touch simulation
//! state. A lost connection is retried with linear backoff.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::game::state::PlayerId;
use crate::network::protocol::{ProtocolError, WireMessage};
use crate::network::sync::{ConnectionState, SyncEndpoints};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay URL
    pub server_url: String,
    /// Reconnect attempts after a failure before giving up
    pub reconnect_attempts: u32,
    /// Backoff step; attempt `n` waits `n * reconnect_backoff`
    pub reconnect_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8765".to_string(),
            reconnect_attempts: 3,
            reconnect_backoff: Duration::from_secs(1),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("RAYMAZE_SERVER_URL") {
            config.server_url = url;
        }
        if let Some(attempts) = std::env::var("RAYMAZE_RECONNECT_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.reconnect_attempts = attempts;
        }
        config
    }
}

/// Client transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Outbound message could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[from] ProtocolError),

    /// Gave up after repeated failures.
    #[error("Reconnect attempts exhausted after {0} tries")]
    ReconnectExhausted(u32),
}

/// Why a connection ended.
#[derive(Debug, PartialEq, Eq)]
enum Disconnect {
    /// Socket closed or failed; worth retrying
    Lost,
    /// The session dropped its queues; stop for good
    SessionGone,
}

/// Spawn the transport task.
///
/// Resolves `Ok` once the session side is dropped, or with
/// [`ClientError::ReconnectExhausted`] when the relay stays unreachable.
pub fn spawn(config: ClientConfig, player_id: PlayerId, endpoints: SyncEndpoints) -> JoinHandle<Result<(), ClientError>> {
    tokio::spawn(run(config, player_id, endpoints))
}

async fn run(config: ClientConfig, player_id: PlayerId, mut endpoints: SyncEndpoints) -> Result<(), ClientError> {
    let mut failures = 0u32;

    loop {
        let _ = endpoints.connection.send(ConnectionState::Connecting);
        info!(url = %config.server_url, player = %player_id, "connecting");

        match connect_async(config.server_url.as_str()).await {
            Ok((ws_stream, _)) => {
                failures = 0;
                let _ = endpoints.connection.send(ConnectionState::Connected);
                info!("WebSocket connected");

                let outcome = run_connection(ws_stream, &player_id, &mut endpoints).await;
                let _ = endpoints.connection.send(ConnectionState::Disconnected);
                match outcome {
                    Ok(Disconnect::SessionGone) => {
                        info!("session closed, transport stopping");
                        return Ok(());
                    }
                    Ok(Disconnect::Lost) => warn!("connection lost"),
                    Err(e) => error!("connection failed: {}", e),
                }
            }
            Err(e) => {
                let _ = endpoints.connection.send(ConnectionState::Disconnected);
                error!("Failed to connect to {}: {}", config.server_url, e);
            }
        }

        failures += 1;
        if failures > config.reconnect_attempts {
            return Err(ClientError::ReconnectExhausted(failures));
        }
        let wait = config.reconnect_backoff * failures;
        debug!(attempt = failures, ?wait, "reconnecting after backoff");
        tokio::time::sleep(wait).await;
    }
}

async fn run_connection<S>(
    ws_stream: tokio_tungstenite::WebSocketStream<S>,
    player_id: &PlayerId,
    endpoints: &mut SyncEndpoints,
) -> Result<Disconnect, ClientError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws_stream.split();

    let join = WireMessage::Join { player_id: player_id.clone() };
    write.send(Message::Text(join.to_json()?)).await?;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if deliver(&endpoints.inbox, &text) == Delivery::SessionGone {
                            return Ok(Disconnect::SessionGone);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed connection");
                        return Ok(Disconnect::Lost);
                    }
                    Some(Err(e)) => {
                        error!("WebSocket read error: {}", e);
                        return Ok(Disconnect::Lost);
                    }
                    Some(Ok(_)) => {}
                }
            }
            out = endpoints.outbox.recv() => {
                let Some(msg) = out else {
                    let _ = write.close().await;
                    return Ok(Disconnect::SessionGone);
                };
                let text = match msg.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(kind = msg.kind(), "Failed to serialize message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text)).await {
                    error!("Failed to send message: {}", e);
                    return Ok(Disconnect::Lost);
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Delivery {
    Queued,
    Dropped,
    SessionGone,
}

/// Decode one text frame into the inbox.
fn deliver(inbox: &mpsc::Sender<WireMessage>, text: &str) -> Delivery {
    let msg = match WireMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("discarding malformed message: {}", e);
            return Delivery::Dropped;
        }
    };
    match inbox.try_send(msg) {
        Ok(()) => Delivery::Queued,
        Err(mpsc::error::TrySendError::Full(msg)) => {
            warn!(kind = msg.kind(), "inbox full, message dropped");
            Delivery::Dropped
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Delivery::SessionGone,
    }
}
