//! Room state management.
//!
//! A room is a two-seat game session addressed by a short shareable code.
//! The first peer in takes [`Role::PlayerOne`], the second [`Role::PlayerTwo`].
//!
//! ```text
//! WaitingForOpponent ──join──▶ Active ──win──▶ Finished
//!                                ▲               │
//!                                └───restart─────┘
//!
//! Active / Finished ──opponent leaves──▶ Abandoned
//! any ──last peer leaves──▶ (removed from RoomManager)
//! ```

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::board::{Board, BoardError, Position, Role, WinningLine};
use super::PeerId;

/// Seats per room.
pub const MAX_ROOM_PEERS: usize = 2;

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 5;

/// Alphabet room codes are drawn from.
const ROOM_CODE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Room lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomStatus {
    /// Creator seated, second seat open
    #[default]
    WaitingForOpponent,
    /// Both seats filled, no winner yet
    Active,
    /// A winning line exists on the board
    Finished,
    /// The opponent left after the match started; the room is not reusable
    Abandoned,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForOpponent => "waiting_for_opponent",
            Self::Active => "active",
            Self::Finished => "finished",
            Self::Abandoned => "abandoned",
        }
    }

    /// Check if moves and powers are accepted.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Stone placed, turn passes to `next`.
    Placed { next: Role },
    /// Stone placed and completed a line; the room is now finished.
    Won { line: WinningLine },
}

/// Room errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room is full")]
    RoomFull,
    #[error("It's not your turn")]
    NotYourTurn,
    #[error("Game is not active")]
    GameNotActive,
    #[error("Cell is already occupied")]
    CellOccupied,
    #[error("Bomb must target an opponent stone")]
    InvalidTarget,
    #[error("Bomb already used this game")]
    NoBombAvailable,
    #[error("Position is off the board")]
    OutOfBounds,
    #[error("Not seated in this room")]
    NotInRoom,
    #[error("Already seated in this room")]
    AlreadyInRoom,
    #[error("Claimed role does not match seat")]
    RoleMismatch,
}

impl RoomError {
    /// Whether the requesting peer is told about this rejection.
    ///
    /// Everything else is dropped without a reply.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::RoomNotFound | Self::RoomFull | Self::AlreadyInRoom
        )
    }
}

impl From<BoardError> for RoomError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::OutOfBounds => Self::OutOfBounds,
            BoardError::CellOccupied => Self::CellOccupied,
            BoardError::CellEmpty => Self::InvalidTarget,
        }
    }
}

/// Room state.
#[derive(Debug, Clone)]
pub struct Room {
    /// Shareable room code
    pub code: String,

    /// Current status
    pub status: RoomStatus,

    /// The game board
    pub board: Board,

    /// Seated peers with the role each took on joining
    seats: Vec<(PeerId, Role)>,

    /// Role expected to move next
    pub to_move: Role,

    /// Unused bomb per role, indexed by [`Role::index`]
    bombs: [bool; MAX_ROOM_PEERS],

    /// Winner of the current game, once finished
    pub winner: Option<Role>,

    /// Completed games in this room
    pub games_played: u32,

    /// When the room was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// When the current game started
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,

    /// When the current game ended
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Room {
    /// Create a room with its creator seated as player one.
    pub fn new(code: String, creator: PeerId) -> Self {
        Self {
            code,
            status: RoomStatus::WaitingForOpponent,
            board: Board::new(),
            seats: vec![(creator, Role::PlayerOne)],
            to_move: Role::PlayerOne,
            bombs: [true; MAX_ROOM_PEERS],
            winner: None,
            games_played: 0,
            created_at: chrono::Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Seat a second peer in the open role and start the game.
    pub fn join(&mut self, peer: PeerId) -> Result<Role, RoomError> {
        self.check_joinable(peer)?;
        let role = match self.seats.first() {
            Some((_, taken)) => taken.opponent(),
            None => Role::PlayerOne,
        };
        self.seats.push((peer, role));
        self.start_game();
        Ok(role)
    }

    /// Check that `peer` could take the open seat.
    pub fn check_joinable(&self, peer: PeerId) -> Result<(), RoomError> {
        if self.has_peer(peer) {
            return Err(RoomError::AlreadyInRoom);
        }
        if self.status == RoomStatus::Abandoned {
            return Err(RoomError::RoomNotFound);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        Ok(())
    }

    /// Place a stone for `peer` and check for a win.
    pub fn make_move(&mut self, peer: PeerId, pos: Position) -> Result<MoveOutcome, RoomError> {
        let role = self.check_turn(peer)?;
        self.board.apply_mark(pos, role)?;

        if let Some(line) = self.board.detect_win(pos, role) {
            self.finish(role);
            return Ok(MoveOutcome::Won { line });
        }

        self.to_move = role.opponent();
        Ok(MoveOutcome::Placed { next: self.to_move })
    }

    /// Spend `peer`'s bomb clearing an opponent stone.
    pub fn use_power(&mut self, peer: PeerId, pos: Position) -> Result<(), RoomError> {
        let role = self.check_turn(peer)?;
        if !self.has_bomb(role) {
            return Err(RoomError::NoBombAvailable);
        }
        match self.board.get(pos).ok_or(RoomError::OutOfBounds)?.owner() {
            Some(owner) if owner == role.opponent() => {}
            _ => return Err(RoomError::InvalidTarget),
        }

        self.board.apply_clear(pos)?;
        self.bombs[role.index()] = false;
        self.to_move = role.opponent();
        Ok(())
    }

    /// Record a win announced by a client.
    ///
    /// Returns `true` only on the transition into [`RoomStatus::Finished`], so
    /// callers can count each match exactly once.
    pub fn report_win(&mut self, winner: Role) -> Result<bool, RoomError> {
        match self.status {
            RoomStatus::Finished => Ok(false),
            RoomStatus::Active => {
                self.finish(winner);
                Ok(true)
            }
            _ => Err(RoomError::GameNotActive),
        }
    }

    /// Reset for a fresh game.
    ///
    /// The room only becomes active again while both seats are filled.
    pub fn restart(&mut self) {
        if self.is_full() {
            self.start_game();
        } else {
            self.reset_game();
        }
    }

    /// Unseat a peer. Returns the role they held.
    pub fn remove_peer(&mut self, peer: PeerId) -> Option<Role> {
        let role = self.role_of(peer)?;
        self.seats.retain(|(p, _)| *p != peer);

        if !self.seats.is_empty() && self.status != RoomStatus::WaitingForOpponent {
            self.status = RoomStatus::Abandoned;
        }

        Some(role)
    }

    /// Role held by a seated peer. Fixed from the moment they sat down.
    pub fn role_of(&self, peer: PeerId) -> Option<Role> {
        self.seats
            .iter()
            .find_map(|(p, role)| (*p == peer).then_some(*role))
    }

    /// The other seated peer, if any.
    pub fn opponent_of(&self, peer: PeerId) -> Option<PeerId> {
        self.seats.iter().map(|(p, _)| *p).find(|p| *p != peer)
    }

    pub fn has_bomb(&self, role: Role) -> bool {
        self.bombs[role.index()]
    }

    /// Seated peers in join order.
    pub fn peers(&self) -> Vec<PeerId> {
        self.seats.iter().map(|(p, _)| *p).collect()
    }

    pub fn has_peer(&self, peer: PeerId) -> bool {
        self.seats.iter().any(|(p, _)| *p == peer)
    }

    pub fn peer_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= MAX_ROOM_PEERS
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Convert to JSON for diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "room_id": self.code,
            "status": self.status.as_str(),
            "peers": self.seats.len(),
            "to_move": self.to_move,
            "bombs": {
                "p1": self.bombs[Role::PlayerOne.index()],
                "p2": self.bombs[Role::PlayerTwo.index()]
            },
            "winner": self.winner,
            "games_played": self.games_played,
            "created_at": self.created_at
        })
    }

    fn check_turn(&self, peer: PeerId) -> Result<Role, RoomError> {
        let role = self.role_of(peer).ok_or(RoomError::NotInRoom)?;
        if !self.status.is_active() {
            return Err(RoomError::GameNotActive);
        }
        if role != self.to_move {
            return Err(RoomError::NotYourTurn);
        }
        Ok(role)
    }

    fn start_game(&mut self) {
        self.reset_game();
        self.status = RoomStatus::Active;
        self.started_at = Some(chrono::Utc::now());
    }

    fn reset_game(&mut self) {
        self.board.reset();
        self.bombs = [true; MAX_ROOM_PEERS];
        self.to_move = Role::PlayerOne;
        self.winner = None;
        self.finished_at = None;
    }

    fn finish(&mut self, winner: Role) {
        self.status = RoomStatus::Finished;
        self.winner = Some(winner);
        self.games_played += 1;
        self.finished_at = Some(chrono::Utc::now());
    }
}

/// Room manager - the process-wide registry of open rooms.
#[derive(Debug)]
pub struct RoomManager {
    /// Rooms by code
    rooms: HashMap<String, Room>,

    /// Source for room codes
    rng: SmallRng,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomManager {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    /// Deterministic codes, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            rooms: HashMap::new(),
            rng,
        }
    }

    /// Open a room with `creator` seated. Returns the room code.
    pub fn create(&mut self, creator: PeerId) -> String {
        let code = self.unused_code();
        info!(room = %code, peer = creator, "room created");
        self.rooms.insert(code.clone(), Room::new(code.clone(), creator));
        code
    }

    /// Seat `peer` in the room with `code` (case-insensitive).
    pub fn join(&mut self, code: &str, peer: PeerId) -> Result<(String, Role), RoomError> {
        let code = normalize_code(code);
        let room = self.rooms.get_mut(&code).ok_or(RoomError::RoomNotFound)?;
        let role = room.join(peer)?;
        info!(room = %code, peer, "room joined, game started");
        Ok((code, role))
    }

    /// Unseat `peer` from `code`, removing the room once it is empty.
    ///
    /// Returns the remaining peer, if any. Unknown rooms and peers are ignored.
    pub fn leave(&mut self, code: &str, peer: PeerId) -> Option<PeerId> {
        let room = self.rooms.get_mut(code)?;
        room.remove_peer(peer)?;

        if room.is_empty() {
            self.remove(code);
            return None;
        }

        debug!(room = %code, peer, "peer left room");
        room.peers().first().copied()
    }

    /// Get room by code.
    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Get mutable room by code.
    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Remove a room entirely.
    pub fn remove(&mut self, code: &str) -> Option<Room> {
        let room = self.rooms.remove(code)?;
        info!(room = %code, games = room.games_played, "room torn down");
        Some(room)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    /// Count rooms.
    pub fn count(&self) -> usize {
        self.rooms.len()
    }

    /// Count rooms with a game in progress.
    pub fn active_count(&self) -> usize {
        self.rooms.values().filter(|r| r.status.is_active()).count()
    }

    /// Get all room codes.
    pub fn codes(&self) -> impl Iterator<Item = &String> {
        self.rooms.keys()
    }

    fn unused_code(&mut self) -> String {
        loop {
            let code = self.random_code();
            if !self.rooms.contains_key(&code) {
                return code;
            }
            debug!(room = %code, "room code collision, retrying");
        }
    }

    fn random_code(&mut self) -> String {
        (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_CHARSET[self.rng.random_range(0..ROOM_CODE_CHARSET.len())] as char)
            .collect()
    }
}

/// Canonical form of a user-typed room code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
