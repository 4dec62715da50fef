//! Bomb Gomoku session library
//!
//! Authoritative room and session state for a two-player five-in-a-row game
//! on a 9x9 board, where each player may once per game blow up one of the
//! opponent's stones.
//!
//! # Overview
//!
//! - **Board** - grid storage and five-in-a-row detection.
//!
//! - **Rooms** - two-seat sessions keyed by a short code, with turn order,
//!   bomb availability and win/restart lifecycle.
//!
//! - **Gateway** - maps peers to seats, validates requests, and addresses the
//!   resulting events to one peer, a room, or everyone.
//!
//! - **Leaderboard** - global win counters shared by all rooms.
//!
//! # Design Principles
//!
//! 1. **State machines validate transitions** - rooms and peers reject invalid
//!    requests with typed errors instead of mutating state.
//!
//! 2. **No networking in the core** - [`SessionGateway`] consumes
//!    [`ClientMessage`]s and returns [`Outbound`] messages; the optional
//!    `server` feature hosts it over WebSockets.
//!
//! 3. **Closed message set** - every wire event is one enum variant, checked
//!    when the frame is parsed.
//!
//! # Example
//!
//! ```rust
//! use bomb_gomoku::{ClientMessage, GatewayOptions, Role, ServerMessage, SessionGateway};
//!
//! let mut gateway = SessionGateway::new(GatewayOptions::default());
//! gateway.connect(1);
//! gateway.connect(2);
//!
//! let out = gateway.handle(1, ClientMessage::CreateRoom);
//! let ServerMessage::RoomCreated { room_id, .. } = out[0].message.clone() else {
//!     unreachable!();
//! };
//!
//! gateway.handle(2, ClientMessage::JoinRoom { room_id: room_id.clone() });
//!
//! let out = gateway.handle(
//!     1,
//!     ClientMessage::MakeMove { room_id, row: 4, col: 4, player: Role::PlayerOne },
//! );
//! assert_eq!(
//!     out[0].message,
//!     ServerMessage::MoveMade { row: 4, col: 4, player: Role::PlayerOne }
//! );
//! ```

pub mod gateway;
pub mod protocol;
pub mod state;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod logging;
#[cfg(feature = "server")]
pub mod server;

pub use gateway::{GatewayOptions, SessionGateway};
pub use protocol::{ClientMessage, Outbound, Recipient, ServerMessage};
pub use state::*;
