//! Game state types and managers.
//!
//! - `board` - the 9x9 grid and win detection
//! - `room` - per-room state machine and the room registry
//! - `peer` - peer location state machine (connected? seated where?)
//! - `connection` - connected peers and their seats
//! - `leaderboard` - process-wide win counters
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        SessionGateway                          │
//! │                                                                │
//! │  ┌───────────────────┐  ┌──────────────────┐  ┌─────────────┐ │
//! │  │ ConnectionManager │  │   RoomManager    │  │ Leaderboard │ │
//! │  │                   │  │                  │  │             │ │
//! │  │ peer_id →         │  │ room code →      │  │ p1 wins     │ │
//! │  │   Connection      │  │   Room           │  │ p2 wins     │ │
//! │  │   (PeerState:     │  │   (Board, turn,  │  │ matches     │ │
//! │  │    room + role)   │  │    bombs, status)│  │             │ │
//! │  └───────────────────┘  └──────────────────┘  └─────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod board;
pub mod connection;
pub mod leaderboard;
pub mod peer;
pub mod room;

/// Opaque transport session identifier.
pub type PeerId = u64;

pub use board::{
    Axis, Board, BoardError, Cell, InvalidRole, Position, Role, WinningLine, BOARD_SIZE,
    WIN_LENGTH,
};
pub use connection::{Connection, ConnectionManager};
pub use leaderboard::{Leaderboard, LeaderboardSnapshot};
pub use peer::{InvalidTransition, PeerEvent, PeerLocation, PeerState};
pub use room::{
    normalize_code, MoveOutcome, Room, RoomError, RoomManager, RoomStatus, MAX_ROOM_PEERS,
    ROOM_CODE_LEN,
};
