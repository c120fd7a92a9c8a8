//! HMR WebSocket handling.
//!
//! # Responsibilities
//! - Complete the upgrade handshake on `/__hmr`
//! - Send `connected`, then forward every hub event as a JSON text frame
//! - Close when the client leaves or the server shuts down
//!
//! # Design Decisions
//! - Subscribe to the hub before the upgrade completes so no event published
//!   after the handshake is missed
//! - Incoming client frames are ignored apart from close

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::hmr::HmrEvent;
use crate::http::server::AppState;

/// Upgrade handler for `GET /__hmr`.
pub async fn hmr_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let events = state.hub.subscribe();
    let shutdown = state.shutdown.subscribe();
    ws.on_upgrade(move |socket| serve_client(socket, events, shutdown))
}

async fn serve_client(
    mut socket: WebSocket,
    mut events: broadcast::Receiver<HmrEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let client_id = Uuid::new_v4();
    tracing::info!(client_id = %client_id, "HMR client connected");

    if let Err(e) = send_event(&mut socket, &HmrEvent::Connected).await {
        tracing::debug!(client_id = %client_id, error = %e, "HMR handshake failed");
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let Err(e) = send_event(&mut socket, &event).await {
                        tracing::debug!(client_id = %client_id, error = %e, "HMR send failed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(client_id = %client_id, skipped, "HMR client lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            message = socket.recv() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(client_id = %client_id, error = %e, "HMR receive failed");
                    break;
                }
            },
            _ = shutdown.recv() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    tracing::info!(client_id = %client_id, "HMR client disconnected");
}

async fn send_event(socket: &mut WebSocket, event: &HmrEvent) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).map_err(axum::Error::new)?;
    socket.send(Message::Text(text.into())).await
}
