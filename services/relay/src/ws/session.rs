//! Manages the relay session lifecycle: one downstream client bridged to one
//! authenticated upstream connection.
//!
//! Each session runs both forwarding directions in a single cooperative
//! `select!` loop. Each half of each link is written by exactly one branch,
//! so no locking is needed, and whichever direction ends first tears the
//! whole session down. Faults are reported to the downstream client as a
//! structured error frame before closing; a peer disconnect is a normal end
//! of session, not an error.

use super::upstream::{self, UpstreamStream};
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use parley_core::event::{self, RelayEvent};
use std::sync::Arc;
use tokio_tungstenite::tungstenite::{self, protocol::Message as WsMessage};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Entry point for a new downstream connection.
///
/// Resolves the credential and establishes the upstream link before any
/// forwarding starts. Both failure modes surface to the client as one
/// structured error frame followed by closure, never a silent disconnect.
#[instrument(name = "relay_session", skip_all, fields(session_id = %Uuid::new_v4()))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("New downstream connection");

    let api_key = match state.config.api_key() {
        Ok(key) => key.to_owned(),
        Err(e) => {
            warn!("Rejecting session: {}", e);
            reject(socket, e.to_string()).await;
            return;
        }
    };

    let upstream = match upstream::connect(&state.config.upstream_url, &api_key).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = ?e, "Upstream connection failed");
            reject(socket, e.to_string()).await;
            return;
        }
    };
    info!("Connected to upstream realtime API");

    run_relay(socket, upstream).await;
    info!("Relay session finished");
}

/// Sends one error frame downstream and closes the connection.
async fn reject(mut socket: WebSocket, message: String) {
    let frame = RelayEvent::error(message);
    if let Ok(serialized) = serde_json::to_string(&frame) {
        let _ = socket.send(Message::Text(serialized.into())).await;
    }
    let _ = socket.close().await;
}

/// Runs the duplex forwarding loop and owns the session's teardown policy.
///
/// Whichever direction ends first ends the session; closing both links is
/// idempotent, so the other direction's resulting disconnect is expected
/// rather than a second error. Internal faults are reported downstream
/// best-effort before closing.
async fn run_relay(socket: WebSocket, upstream: UpstreamStream) {
    let (mut down_tx, mut down_rx) = socket.split();
    let (mut up_tx, mut up_rx) = upstream.split();

    if let Err(e) = relay_loop(&mut down_tx, &mut down_rx, &mut up_tx, &mut up_rx).await {
        error!(error = ?e, "Relay session failed");
        let frame = RelayEvent::error(e.to_string());
        if let Ok(serialized) = serde_json::to_string(&frame) {
            let _ = down_tx.send(Message::Text(serialized.into())).await;
        }
    }

    let _ = up_tx.close().await;
    let _ = down_tx.close().await;
}

/// Forwards frames in both directions until either link closes.
///
/// Frames are forwarded verbatim, one at a time, in arrival order; the
/// `type` tag is only parsed for logging, so malformed control-plane JSON
/// degrades to unclassified forwarding instead of being rejected.
async fn relay_loop(
    down_tx: &mut SplitSink<WebSocket, Message>,
    down_rx: &mut SplitStream<WebSocket>,
    up_tx: &mut SplitSink<UpstreamStream, WsMessage>,
    up_rx: &mut SplitStream<UpstreamStream>,
) -> Result<()> {
    loop {
        tokio::select! {
            inbound = down_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Some(kind) = event::message_type(text.as_str()) {
                        // Mic audio appends are too chatty to log.
                        if !event::is_quiet_client_type(&kind) {
                            debug!(%kind, "-> upstream");
                        }
                    }
                    up_tx
                        .send(WsMessage::Text(text.as_str().into()))
                        .await
                        .context("Failed to forward frame upstream")?;
                }
                Some(Ok(Message::Binary(data))) => {
                    up_tx
                        .send(WsMessage::Binary(data))
                        .await
                        .context("Failed to forward frame upstream")?;
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Downstream disconnected");
                    break;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(e)) => {
                    // The peer is already gone; there is nobody to report to.
                    info!("Downstream receive ended: {}", e);
                    break;
                }
            },
            inbound = up_rx.next() => match inbound {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Some(kind) = event::message_type(text.as_str()) {
                        if !event::is_quiet_upstream_type(&kind) {
                            debug!(%kind, "<- upstream");
                        }
                    }
                    down_tx
                        .send(Message::Text(text.as_str().into()))
                        .await
                        .context("Failed to forward frame downstream")?;
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    down_tx
                        .send(Message::Binary(data))
                        .await
                        .context("Failed to forward frame downstream")?;
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("Upstream closed");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                )) => {
                    info!("Upstream closed");
                    break;
                }
                Some(Err(e)) => {
                    return Err(e).context("Upstream receive failed");
                }
            },
        }
    }
    Ok(())
}
