//! Room bookkeeping: membership, the drawing turn and the part backlog.

use crate::config::ServerConfig;
use dashmap::DashMap;
use drawsync_core::{Part, PartDefect, PartKind, ServerMessage};
use std::collections::VecDeque;
use tokio::sync::broadcast;

/// Origin used for messages every peer must receive, including the one
/// whose request caused them. Peer ids are never empty.
pub const SERVER_ORIGIN: &str = "";

pub type RoomMessage = (String, ServerMessage);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RelayError {
    #[error("not in a room")]
    NotInRoom,
    #[error("only the drawer may send parts")]
    NotDrawer,
    #[error("turn is held by {0}")]
    TurnTaken(String),
    #[error("invalid part: {0}")]
    InvalidPart(#[from] PartDefect),
}

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<RoomMessage>,
    /// Connected peer IDs in join order
    peers: Vec<String>,
    /// Peer allowed to draw
    drawer: Option<String>,
    /// Relayed parts, oldest first
    backlog: VecDeque<Part>,
}

impl Room {
    fn new(channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity);
        Self {
            tx,
            peers: Vec::new(),
            drawer: None,
            backlog: VecDeque::new(),
        }
    }

    /// Longest-waiting peer other than `except`.
    fn next_drawer(&self, except: &str) -> Option<String> {
        self.peers.iter().find(|p| p.as_str() != except).cloned()
    }

    /// Hand the turn from the current drawer to `next`.
    ///
    /// A stroke the old drawer left open gets an empty closing part in the
    /// backlog, so late joiners do not continue it with the next drawer's parts.
    fn pass_turn(&mut self, next: Option<String>, max_backlog: usize) {
        let open_style = self
            .backlog
            .back()
            .filter(|part| part.kind() == PartKind::Drawing && !part.is_gesture_end())
            .map(Part::style);
        if let Some(style) = open_style {
            while self.backlog.len() >= max_backlog {
                self.backlog.pop_front();
            }
            self.backlog.push_back(Part::drawing(&[], style, true));
        }
        self.drawer = next;
    }
}

/// What a peer learns when it joins.
pub struct JoinInfo {
    pub rx: broadcast::Receiver<RoomMessage>,
    pub peer_count: usize,
    pub drawer: Option<String>,
    pub backlog: Vec<Part>,
}

/// Shared application state
pub struct AppState {
    /// Active rooms
    rooms: DashMap<String, Room>,
    config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn drawer(&self, room_id: &str) -> Option<String> {
        self.rooms.get(room_id).and_then(|room| room.drawer.clone())
    }

    pub fn backlog_len(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.backlog.len())
    }

    /// Add peer to room. A peer joining a room without a drawer takes the turn.
    pub fn join_room(&self, room_id: &str, peer_id: &str) -> JoinInfo {
        let capacity = self.config.channel_capacity;
        let mut room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(capacity));
        if !room.peers.iter().any(|p| p == peer_id) {
            room.peers.push(peer_id.to_string());
        }
        if room.drawer.is_none() {
            room.drawer = Some(peer_id.to_string());
        }
        JoinInfo {
            rx: room.tx.subscribe(),
            peer_count: room.peers.len(),
            drawer: room.drawer.clone(),
            backlog: room.backlog.iter().cloned().collect(),
        }
    }

    /// Remove peer from room.
    ///
    /// Returns `Some(new_drawer)` when the peer held the turn and it moved on.
    pub fn leave_room(&self, room_id: &str, peer_id: &str) -> Option<Option<String>> {
        let mut room = self.rooms.get_mut(room_id)?;
        let changed = if room.drawer.as_deref() == Some(peer_id) {
            let next = room.next_drawer(peer_id);
            room.pass_turn(next, self.config.max_backlog);
            Some(room.drawer.clone())
        } else {
            None
        };
        room.peers.retain(|p| p != peer_id);
        // Clean up empty rooms
        if room.peers.is_empty() {
            drop(room);
            self.rooms.remove(room_id);
            return None;
        }
        changed
    }

    /// Give `peer_id` the turn if nobody holds it.
    ///
    /// Returns `Ok(true)` when the turn changed hands.
    pub fn request_turn(&self, room_id: &str, peer_id: &str) -> Result<bool, RelayError> {
        let mut room = self.rooms.get_mut(room_id).ok_or(RelayError::NotInRoom)?;
        match room.drawer.as_deref() {
            Some(drawer) if drawer == peer_id => Ok(false),
            Some(drawer) => Err(RelayError::TurnTaken(drawer.to_string())),
            None => {
                room.drawer = Some(peer_id.to_string());
                Ok(true)
            }
        }
    }

    /// Pass the turn from `peer_id` to the longest-waiting other peer.
    ///
    /// Returns `Some(new_drawer)` when `peer_id` held the turn.
    pub fn release_turn(&self, room_id: &str, peer_id: &str) -> Option<Option<String>> {
        let mut room = self.rooms.get_mut(room_id)?;
        if room.drawer.as_deref() != Some(peer_id) {
            return None;
        }
        let next = room.next_drawer(peer_id);
        room.pass_turn(next, self.config.max_backlog);
        Some(room.drawer.clone())
    }

    /// Store and broadcast a part from the drawer.
    pub fn relay_part(&self, room_id: &str, peer_id: &str, part: Part) -> Result<(), RelayError> {
        let mut room = self.rooms.get_mut(room_id).ok_or(RelayError::NotInRoom)?;
        if room.drawer.as_deref() != Some(peer_id) {
            return Err(RelayError::NotDrawer);
        }
        part.validate()?;

        if self.config.max_backlog > 0 {
            while room.backlog.len() >= self.config.max_backlog {
                room.backlog.pop_front();
            }
            room.backlog.push_back(part.clone());
        }
        let _ = room.tx.send((
            peer_id.to_string(),
            ServerMessage::Part {
                from: peer_id.to_string(),
                part,
            },
        ));
        Ok(())
    }

    /// Broadcast message to room
    pub fn broadcast(&self, room_id: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }

    /// Tell every peer in the room who draws now.
    pub fn announce_turn(&self, room_id: &str, drawer: Option<String>) {
        self.broadcast(room_id, SERVER_ORIGIN, ServerMessage::Turn { drawer });
    }
}
