//! Relay wire protocol.
//!
//! Messages are JSON objects tagged by `"type"`:
//! ```json
//! { "type": "join", "room": "room-id" }
//! { "type": "part", "part": { "kind": "undo" } }
//! { "type": "turn", "drawer": "3f0c..." }
//! ```

use crate::part::Part;
use serde::{Deserialize, Serialize};

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room
    Join { room: String },
    /// Leave current room
    Leave,
    /// A part produced by the local engine
    Part { part: Part },
    /// Ask for the drawing turn
    RequestTurn,
    /// Give the drawing turn to the next peer
    ReleaseTurn,
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirm room join with current state
    Joined {
        room: String,
        /// Id the server assigned to this connection
        peer_id: String,
        peer_count: usize,
        /// Peer currently allowed to draw
        drawer: Option<String>,
        /// Parts relayed so far, oldest first
        #[serde(default)]
        backlog: Vec<Part>,
    },
    /// Peer joined the room
    PeerJoined { peer_id: String },
    /// Peer left the room
    PeerLeft { peer_id: String },
    /// Part from the drawer
    Part { from: String, part: Part },
    /// The drawing turn changed hands
    Turn { drawer: Option<String> },
    /// Error message
    Error { message: String },
}

impl ClientMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::PartKind;

    #[test]
    fn test_client_message_tags() {
        let join = ClientMessage::Join { room: "r1".to_string() };
        assert_eq!(join.to_json().unwrap(), r#"{"type":"join","room":"r1"}"#);
        assert_eq!(
            ClientMessage::RequestTurn.to_json().unwrap(),
            r#"{"type":"request_turn"}"#
        );
        let part = ClientMessage::Part { part: Part::undo() };
        assert!(part.to_json().unwrap().starts_with(r#"{"type":"part","part":{"kind":"undo""#));
    }

    #[test]
    fn test_joined_without_backlog() {
        let json = r#"{"type":"joined","room":"r1","peer_id":"a","peer_count":1,"drawer":null}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Joined {
                room: "r1".to_string(),
                peer_id: "a".to_string(),
                peer_count: 1,
                drawer: None,
                backlog: Vec::new(),
            }
        );
    }

    #[test]
    fn test_part_from_peer() {
        let json = r#"{"type":"part","from":"b","part":{"kind":"filling","coordinates":[1,2],"color":[255,0,0,1]}}"#;
        let ServerMessage::Part { from, part } = serde_json::from_str(json).unwrap() else {
            panic!("expected a part message");
        };
        assert_eq!(from, "b");
        assert_eq!(part.kind(), PartKind::Filling);
        assert_eq!(part.coordinates(), &[1.0, 2.0]);
    }
}
