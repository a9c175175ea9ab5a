//! Peer session: the bridge between a [`DrawingEngine`] and the relay.
//!
//! The session owns no socket. Callers feed it server messages through
//! [`Session::handle_message`] and ship whatever [`Session::take_outgoing`]
//! returns. Parts the engine produces are picked up by [`Session::pump`].

use crate::engine::{DrawingEngine, PartDisposition};
use crate::part::Part;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::surface::PixelSurface;
use std::sync::mpsc::Receiver;

/// What handling a server message did.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Joined a room; `replayed` backlog parts were applied
    Joined {
        room: String,
        peer_id: String,
        peer_count: usize,
        drawer: Option<String>,
        replayed: usize,
    },
    PeerJoined { peer_id: String },
    PeerLeft { peer_id: String },
    /// A remote part was drawn
    PartApplied { from: String },
    /// A remote part arrived while this peer was editing
    PartIgnored { from: String },
    /// A remote part was malformed and not applied
    Rejected { from: String, reason: String },
    /// The drawing turn changed hands
    TurnChanged { drawer: Option<String>, is_mine: bool },
    /// Error reported by the server
    Error { message: String },
}

/// Collaboration state for one connected engine.
pub struct Session {
    /// Parts produced by the engine, not yet forwarded.
    parts: Receiver<Part>,
    /// Current room (set when the server confirms the join).
    room: Option<String>,
    /// Id the server gave this connection.
    peer_id: Option<String>,
    drawer: Option<String>,
    /// Pending outgoing messages (JSON strings).
    outgoing: Vec<String>,
}

impl Session {
    /// Attach a session to `engine`'s part output.
    pub fn new<S: PixelSurface>(engine: &mut DrawingEngine<S>) -> Self {
        Self {
            parts: engine.on_part_produced(),
            room: None,
            peer_id: None,
            drawer: None,
            outgoing: Vec::new(),
        }
    }

    pub fn current_room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn is_in_room(&self) -> bool {
        self.room.is_some()
    }

    pub fn peer_id(&self) -> Option<&str> {
        self.peer_id.as_deref()
    }

    pub fn drawer(&self) -> Option<&str> {
        self.drawer.as_deref()
    }

    /// Whether this peer holds the drawing turn.
    pub fn is_drawer(&self) -> bool {
        self.peer_id.is_some() && self.drawer == self.peer_id
    }

    // --- Outgoing ---

    fn queue(&mut self, msg: ClientMessage) {
        match msg.to_json() {
            Ok(json) => self.outgoing.push(json),
            Err(e) => log::warn!("failed to encode outgoing message: {e}"),
        }
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Queue every part the engine produced since the last pump.
    ///
    /// Outside a room the parts are dropped. Returns how many were queued.
    pub fn pump(&mut self) -> usize {
        let parts: Vec<Part> = self.parts.try_iter().collect();
        if self.room.is_none() {
            return 0;
        }
        let count = parts.len();
        for part in parts {
            self.queue(ClientMessage::Part { part });
        }
        count
    }

    // --- Room management ---

    /// Request to join a room. Queues the join message.
    pub fn join_room(&mut self, room: &str) {
        self.queue(ClientMessage::Join { room: room.to_string() });
    }

    /// Leave the current room and go back to drawing alone.
    pub fn leave_room<S: PixelSurface>(&mut self, engine: &mut DrawingEngine<S>) {
        if self.room.is_none() {
            return;
        }
        self.pump();
        self.queue(ClientMessage::Leave);
        self.room = None;
        self.drawer = None;
        engine.enable_local_editing();
    }

    /// Ask the server for the drawing turn.
    pub fn request_turn(&mut self) {
        if self.room.is_some() {
            self.queue(ClientMessage::RequestTurn);
        }
    }

    /// Hand the drawing turn on. Local editing stops at once, so no part
    /// drawn after the release is sent.
    pub fn release_turn<S: PixelSurface>(&mut self, engine: &mut DrawingEngine<S>) {
        if !self.is_drawer() {
            return;
        }
        engine.disable_local_editing();
        self.pump();
        self.queue(ClientMessage::ReleaseTurn);
    }

    fn apply_turn<S: PixelSurface>(&mut self, drawer: Option<String>, engine: &mut DrawingEngine<S>) {
        if drawer != self.drawer {
            // The previous drawer sends nothing more; their stroke ends here.
            engine.close_remote_stroke();
        }
        self.drawer = drawer;
        if self.is_drawer() {
            engine.enable_local_editing();
        } else {
            engine.disable_local_editing();
        }
        // Disabling may have finished an open stroke.
        self.pump();
    }

    // --- Incoming ---

    /// Handle an incoming server message.
    /// Returns a SessionEvent describing what happened.
    pub fn handle_message<S: PixelSurface>(
        &mut self,
        json: &str,
        engine: &mut DrawingEngine<S>,
    ) -> Option<SessionEvent> {
        let msg: ServerMessage = match serde_json::from_str(json) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("undecodable server message: {e}");
                return None;
            }
        };

        match msg {
            ServerMessage::Joined {
                room,
                peer_id,
                peer_count,
                drawer,
                backlog,
            } => {
                // Parts drawn before joining belong to a board the room never saw.
                self.parts.try_iter().for_each(drop);
                let mode = engine.mode();
                engine.reset();
                engine.set_mode(mode);
                engine.disable_local_editing();

                let mut replayed = 0;
                for part in &backlog {
                    match engine.put_part(part) {
                        Ok(_) => replayed += 1,
                        Err(e) => log::warn!("skipping backlog part: {e}"),
                    }
                }

                self.room = Some(room.clone());
                self.peer_id = Some(peer_id.clone());
                // The backlog's last stroke may still be in flight from this drawer.
                self.drawer = drawer.clone();
                self.apply_turn(drawer.clone(), engine);
                log::debug!("joined {room} as {peer_id}, replayed {replayed} parts");
                Some(SessionEvent::Joined {
                    room,
                    peer_id,
                    peer_count,
                    drawer,
                    replayed,
                })
            }
            ServerMessage::PeerJoined { peer_id } => Some(SessionEvent::PeerJoined { peer_id }),
            ServerMessage::PeerLeft { peer_id } => Some(SessionEvent::PeerLeft { peer_id }),
            ServerMessage::Part { from, part } => match engine.put_part(&part) {
                Ok(PartDisposition::Applied) => Some(SessionEvent::PartApplied { from }),
                Ok(PartDisposition::Ignored) => Some(SessionEvent::PartIgnored { from }),
                Err(e) => Some(SessionEvent::Rejected {
                    from,
                    reason: e.to_string(),
                }),
            },
            ServerMessage::Turn { drawer } => {
                self.apply_turn(drawer.clone(), engine);
                Some(SessionEvent::TurnChanged {
                    drawer,
                    is_mine: self.is_drawer(),
                })
            }
            ServerMessage::Error { message } => Some(SessionEvent::Error { message }),
        }
    }
}
