//! Wire messages between peers and the gateway.
//!
//! Frames are JSON objects tagged by event name:
//!
//! ```json
//! {"event": "makeMove", "data": {"roomId": "K3Q9Z", "row": 4, "col": 4, "player": 1}}
//! ```
//!
//! Events without a payload omit `data`.

use serde::{Deserialize, Serialize};

use crate::state::{LeaderboardSnapshot, PeerId, Position, Role};

/// Requests a peer may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom {
        room_id: String,
    },
    MakeMove {
        room_id: String,
        row: usize,
        col: usize,
        #[serde(alias = "playerRole")]
        player: Role,
    },
    UsePower {
        room_id: String,
        row: usize,
        col: usize,
        #[serde(alias = "playerRole")]
        player: Role,
    },
    ReportWin {
        winner: Role,
    },
    RestartRequest {
        room_id: String,
    },
    LeaveRoom,
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Event name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::MakeMove { .. } => "makeMove",
            Self::UsePower { .. } => "usePower",
            Self::ReportWin { .. } => "reportWin",
            Self::RestartRequest { .. } => "restartRequest",
            Self::LeaveRoom => "leaveRoom",
        }
    }
}

/// Events the gateway sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    RoomCreated {
        room_id: String,
        player: Role,
    },
    RoomJoined {
        room_id: String,
        player: Role,
    },
    StartGame {
        room_id: String,
    },
    MoveMade {
        row: usize,
        col: usize,
        player: Role,
    },
    PowerUsed {
        row: usize,
        col: usize,
    },
    GameOver {
        winner: Role,
        line: Vec<Position>,
    },
    RestartGame,
    OpponentLeft,
    UpdateLeaderboard(LeaderboardSnapshot),
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Encode as a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Who an outbound message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Peer(PeerId),
    /// Every connected peer, seated or not
    All,
}

/// A message addressed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn to_peer(peer: PeerId, message: ServerMessage) -> Self {
        Self {
            to: Recipient::Peer(peer),
            message,
        }
    }

    pub fn to_all(message: ServerMessage) -> Self {
        Self {
            to: Recipient::All,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_requests() {
        assert_eq!(
            ClientMessage::from_json(r#"{"event":"createRoom"}"#).unwrap(),
            ClientMessage::CreateRoom
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"event":"joinRoom","data":{"roomId":"ab12c"}}"#)
                .unwrap(),
            ClientMessage::JoinRoom {
                room_id: "ab12c".to_string()
            }
        );
        assert_eq!(
            ClientMessage::from_json(
                r#"{"event":"usePower","data":{"roomId":"AB12C","row":3,"col":8,"playerRole":2}}"#
            )
            .unwrap(),
            ClientMessage::UsePower {
                room_id: "AB12C".to_string(),
                row: 3,
                col: 8,
                player: Role::PlayerTwo
            }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"event":"reportWin","data":{"winner":1}}"#).unwrap(),
            ClientMessage::ReportWin {
                winner: Role::PlayerOne
            }
        );
    }

    #[test]
    fn test_reject_malformed_requests() {
        for frame in [
            r#"{"event":"launchMissiles"}"#,
            r#"{"event":"makeMove","data":{"roomId":"X","row":-1,"col":0,"player":1}}"#,
            r#"{"event":"makeMove","data":{"roomId":"X","row":1,"col":0,"player":3}}"#,
            r#"{"event":"joinRoom"}"#,
            "not json",
        ] {
            assert!(ClientMessage::from_json(frame).is_err(), "{frame}");
        }
    }

    #[test]
    fn test_encode_events() {
        let created = ServerMessage::RoomCreated {
            room_id: "AB12C".to_string(),
            player: Role::PlayerOne,
        };
        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            json!({"event": "roomCreated", "data": {"roomId": "AB12C", "player": 1}})
        );

        assert_eq!(
            serde_json::to_value(ServerMessage::OpponentLeft).unwrap(),
            json!({"event": "opponentLeft"})
        );

        let board = ServerMessage::UpdateLeaderboard(LeaderboardSnapshot {
            p1_wins: 1,
            p2_wins: 0,
            matches_played: 1,
        });
        assert_eq!(
            serde_json::to_value(&board).unwrap(),
            json!({"event": "updateLeaderboard", "data": {"p1Wins": 1, "p2Wins": 0, "matchesPlayed": 1}})
        );

        let over = ServerMessage::GameOver {
            winner: Role::PlayerTwo,
            line: vec![Position::new(0, 0), Position::new(1, 1)],
        };
        assert_eq!(
            serde_json::to_value(&over).unwrap(),
            json!({"event": "gameOver", "data": {"winner": 2, "line": [{"row": 0, "col": 0}, {"row": 1, "col": 1}]}})
        );
    }

    #[test]
    fn test_names_match_wire_tags() {
        let msg = ClientMessage::RestartRequest {
            room_id: "AB12C".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], msg.name());
    }
}
