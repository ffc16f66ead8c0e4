//! WebSocket relay: streams presence snapshots to browsers over the same
//! framed protocol the upstream gateway speaks.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::handlers::http::AppState;
use crate::models::frame::{
    self, opcode, GatewayFrame, DEFAULT_HEARTBEAT_INTERVAL, INIT_STATE, PRESENCE_UPDATE,
};

/// Upgrade HTTP to WebSocket and hand the connection to the relay loop.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| relay(state, socket))
}

/// Per-connection loop: HELLO, wait for SUBSCRIBE, answer with INIT_STATE,
/// then push every snapshot change as PRESENCE_UPDATE. Client heartbeats are
/// accepted and need no reply.
async fn relay(state: AppState, socket: WebSocket) {
    let conn_id = Uuid::new_v4().as_simple().to_string();
    info!(conn_id = %conn_id, "relay client connected");

    let (mut sender, mut receiver) = socket.split();

    let hello = frame::hello_frame(DEFAULT_HEARTBEAT_INTERVAL);
    if sender.send(Message::Text(hello)).await.is_err() {
        return;
    }

    let mut snapshots = state.presence.subscribe();
    let mut subscribed = false;

    loop {
        tokio::select! {
            changed = snapshots.changed(), if subscribed => {
                if changed.is_err() {
                    break;
                }
                let Some(snapshot) = snapshots.borrow_and_update().clone() else {
                    continue;
                };
                let update = frame::event_frame(PRESENCE_UPDATE, json!(snapshot));
                if sender.send(Message::Text(update)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(_)) | None => break,
                };
                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<GatewayFrame>(&text) {
                            Ok(parsed) if parsed.op == opcode::SUBSCRIBE => {
                                subscribed = true;
                                let snapshot = state.presence.snapshot().unwrap_or_default();
                                let init = frame::event_frame(INIT_STATE, json!(snapshot));
                                if sender.send(Message::Text(init)).await.is_err() {
                                    break;
                                }
                            }
                            Ok(parsed) if parsed.op == opcode::HEARTBEAT => {}
                            Ok(parsed) => {
                                debug!(conn_id = %conn_id, op = parsed.op, "ignoring relay frame");
                            }
                            Err(e) => {
                                debug!(conn_id = %conn_id, error = %e, "malformed relay frame");
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    info!(conn_id = %conn_id, "relay client disconnected");
}
