//! DrawSync WebSocket Relay Server
//!
//! Relays drawing parts from the peer holding the turn to everyone else in
//! the same room, and arbitrates who that peer is.
//!
//! ## Protocol
//!
//! Messages are JSON with the following format:
//! ```json
//! { "type": "join", "room": "room-id" }
//! { "type": "part", "part": { "kind": "drawing", "coordinates": [1, 2], ... } }
//! { "type": "request_turn" }
//! { "type": "release_turn" }
//! ```

mod config;
mod state;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use config::ServerConfig;
use drawsync_core::{ClientMessage, ServerMessage};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use state::{AppState, RoomMessage};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drawsync_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = config.addr;
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };
    info!("DrawSync relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

/// Index page
async fn index() -> &'static str {
    "DrawSync Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

type WsSender = SplitSink<WebSocket, Message>;

/// Send one message; `false` when the socket is gone.
async fn send(sender: &mut WsSender, msg: &ServerMessage) -> bool {
    match msg.to_json() {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode message: {}", e);
            true
        }
    }
}

/// Leave `room`, announcing the departure and any turn change.
fn leave(state: &AppState, room: &str, peer_id: &str) {
    let turn = state.leave_room(room, peer_id);
    state.broadcast(room, peer_id, ServerMessage::PeerLeft {
        peer_id: peer_id.to_string(),
    });
    if let Some(drawer) = turn {
        state.announce_turn(room, drawer);
    }
    info!("Peer {} left room {}", peer_id, room);
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<RoomMessage>> = None;

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => client_msg,
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer_id, e);
                                let err = ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                };
                                if !send(&mut sender, &err).await {
                                    break;
                                }
                                continue;
                            }
                        };

                        let reply = match client_msg {
                            ClientMessage::Join { room } => {
                                // Leave current room if any
                                if let Some(old_room) = current_room.take() {
                                    leave(&state, &old_room, &peer_id);
                                }

                                let info = state.join_room(&room, &peer_id);
                                room_rx = Some(info.rx);
                                current_room = Some(room.clone());

                                let joined = ServerMessage::Joined {
                                    room: room.clone(),
                                    peer_id: peer_id.clone(),
                                    peer_count: info.peer_count,
                                    drawer: info.drawer,
                                    backlog: info.backlog,
                                };
                                if !send(&mut sender, &joined).await {
                                    break;
                                }

                                // Notify others
                                state.broadcast(&room, &peer_id, ServerMessage::PeerJoined {
                                    peer_id: peer_id.clone(),
                                });
                                info!("Peer {} joined room {}", peer_id, room);
                                None
                            }
                            ClientMessage::Leave => {
                                if let Some(room) = current_room.take() {
                                    leave(&state, &room, &peer_id);
                                }
                                room_rx = None;
                                None
                            }
                            ClientMessage::Part { part } => match current_room.as_deref() {
                                Some(room) => match state.relay_part(room, &peer_id, part) {
                                    Ok(()) => None,
                                    Err(e) => {
                                        debug!("Rejected part from {}: {}", peer_id, e);
                                        Some(e.to_string())
                                    }
                                },
                                None => Some("not in a room".to_string()),
                            },
                            ClientMessage::RequestTurn => match current_room.as_deref() {
                                Some(room) => match state.request_turn(room, &peer_id) {
                                    Ok(true) => {
                                        state.announce_turn(room, Some(peer_id.clone()));
                                        None
                                    }
                                    Ok(false) => None,
                                    Err(e) => Some(e.to_string()),
                                },
                                None => Some("not in a room".to_string()),
                            },
                            ClientMessage::ReleaseTurn => {
                                if let Some(room) = current_room.as_deref() {
                                    if let Some(drawer) = state.release_turn(room, &peer_id) {
                                        state.announce_turn(room, drawer);
                                    }
                                }
                                None
                            }
                        };

                        if let Some(message) = reply {
                            if !send(&mut sender, &ServerMessage::Error { message }).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("Ignoring binary message from {}", peer_id);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            // Handle broadcast messages from room
            msg = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await,
                    None => {
                        // No room joined, just wait forever
                        std::future::pending().await
                    }
                }
            } => {
                match msg {
                    Ok((from, server_msg)) => {
                        // Don't echo back to sender
                        if from != peer_id && !send(&mut sender, &server_msg).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed parts would leave this peer's board out of step.
                        warn!("Peer {} lagged behind by {} messages", peer_id, skipped);
                        let err = ServerMessage::Error {
                            message: format!("missed {} messages; rejoin to resync", skipped),
                        };
                        if !send(&mut sender, &err).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        room_rx = None;
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(room) = current_room {
        leave(&state, &room, &peer_id);
    }
    info!("Connection closed: {}", peer_id);
}
