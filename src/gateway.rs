//! Session gateway.
//!
//! Owns every piece of mutable game state and turns peer events into state
//! changes plus addressed [`Outbound`] messages. Callers must serialize access
//! so each request runs to completion before the next one starts.

use tracing::{debug, info, warn};

use crate::protocol::{ClientMessage, Outbound, ServerMessage};
use crate::state::{
    normalize_code, Connection, ConnectionManager, Leaderboard, LeaderboardSnapshot,
    MoveOutcome, PeerId, Position, Role, RoomError, RoomManager,
};

/// Gateway behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Also send `moveMade` / `powerUsed` back to the acting peer.
    pub echo_to_sender: bool,
}

/// Process-wide session state.
#[derive(Debug, Default)]
pub struct SessionGateway {
    connections: ConnectionManager,
    rooms: RoomManager,
    leaderboard: Leaderboard,
    options: GatewayOptions,
}

impl SessionGateway {
    pub fn new(options: GatewayOptions) -> Self {
        Self::with_rooms(RoomManager::new(), options)
    }

    /// Use a prepared room registry (e.g. seeded codes in tests).
    pub fn with_rooms(rooms: RoomManager, options: GatewayOptions) -> Self {
        Self {
            connections: ConnectionManager::new(),
            rooms,
            leaderboard: Leaderboard::new(),
            options,
        }
    }

    /// Register a new transport session and greet it with the leaderboard.
    pub fn connect(&mut self, peer: PeerId) -> Vec<Outbound> {
        self.connections.add(Connection::new(peer));
        debug!(peer, "peer connected");
        vec![Outbound::to_peer(
            peer,
            ServerMessage::UpdateLeaderboard(self.leaderboard.snapshot()),
        )]
    }

    /// Drop a transport session, vacating its seat.
    pub fn disconnect(&mut self, peer: PeerId) -> Vec<Outbound> {
        let mut out = Vec::new();
        self.vacate(peer, &mut out);
        if self.connections.remove(peer).is_some() {
            debug!(peer, "peer disconnected");
        }
        out
    }

    /// Leave the current room. A no-op for unseated peers.
    pub fn leave(&mut self, peer: PeerId) -> Vec<Outbound> {
        let mut out = Vec::new();
        self.vacate(peer, &mut out);
        out
    }

    /// Handle one inbound request.
    pub fn handle(&mut self, peer: PeerId, msg: ClientMessage) -> Vec<Outbound> {
        let Some(conn) = self.connections.get_mut(peer) else {
            warn!(peer, event = msg.name(), "request from unknown peer");
            return Vec::new();
        };
        conn.touch();

        let event = msg.name();
        let mut out = Vec::new();
        let result = match msg {
            ClientMessage::CreateRoom => {
                self.create_room(peer, &mut out);
                Ok(())
            }
            ClientMessage::JoinRoom { room_id } => self.join_room(peer, &room_id, &mut out),
            ClientMessage::MakeMove {
                room_id,
                row,
                col,
                player,
            } => self.make_move(peer, &room_id, Position::new(row, col), player, &mut out),
            ClientMessage::UsePower {
                room_id,
                row,
                col,
                player,
            } => self.use_power(peer, &room_id, Position::new(row, col), player, &mut out),
            ClientMessage::ReportWin { winner } => self.report_win(peer, winner, &mut out),
            ClientMessage::RestartRequest { room_id } => self.restart(peer, &room_id, &mut out),
            ClientMessage::LeaveRoom => {
                self.vacate(peer, &mut out);
                Ok(())
            }
        };

        if let Err(err) = result {
            if err.is_user_visible() {
                out.push(Outbound::to_peer(peer, ServerMessage::error(err.to_string())));
            }
            debug!(peer, event, %err, "request rejected");
        }
        out
    }

    pub fn leaderboard(&self) -> LeaderboardSnapshot {
        self.leaderboard.snapshot()
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Summary for health checks.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "rooms": self.rooms.count(),
            "active_rooms": self.rooms.active_count(),
            "peers": self.connections.connected_count(),
            "seated_peers": self.connections.seated_count(),
            "leaderboard": self.leaderboard.snapshot()
        })
    }

    fn create_room(&mut self, peer: PeerId, out: &mut Vec<Outbound>) {
        self.vacate(peer, out);

        let code = self.rooms.create(peer);
        self.take_seat(peer, &code, Role::PlayerOne);
        out.push(Outbound::to_peer(
            peer,
            ServerMessage::RoomCreated {
                room_id: code,
                player: Role::PlayerOne,
            },
        ));
    }

    fn join_room(
        &mut self,
        peer: PeerId,
        room_id: &str,
        out: &mut Vec<Outbound>,
    ) -> Result<(), RoomError> {
        let code = normalize_code(room_id);
        self.rooms
            .get(&code)
            .ok_or(RoomError::RoomNotFound)?
            .check_joinable(peer)?;

        self.vacate(peer, out);

        let (code, role) = self.rooms.join(&code, peer)?;
        self.take_seat(peer, &code, role);
        out.push(Outbound::to_peer(
            peer,
            ServerMessage::RoomJoined {
                room_id: code.clone(),
                player: role,
            },
        ));
        self.to_room(&code, ServerMessage::StartGame { room_id: code.clone() }, out);
        Ok(())
    }

    fn make_move(
        &mut self,
        peer: PeerId,
        room_id: &str,
        pos: Position,
        claimed: Role,
        out: &mut Vec<Outbound>,
    ) -> Result<(), RoomError> {
        let (code, role) = self.seat_for(peer, room_id, claimed)?;
        let room = self.rooms.get_mut(&code).ok_or(RoomError::NotInRoom)?;
        let outcome = room.make_move(peer, pos)?;
        let opponent = room.opponent_of(peer);

        let moved = ServerMessage::MoveMade {
            row: pos.row,
            col: pos.col,
            player: role,
        };
        self.relay(peer, opponent, moved, out);

        if let MoveOutcome::Won { line } = outcome {
            info!(room = %code, winner = role.number(), length = line.len(), "line completed");
            self.to_room(
                &code,
                ServerMessage::GameOver {
                    winner: role,
                    line: line.cells,
                },
                out,
            );
            self.record_result(role, out);
        }
        Ok(())
    }

    fn use_power(
        &mut self,
        peer: PeerId,
        room_id: &str,
        pos: Position,
        claimed: Role,
        out: &mut Vec<Outbound>,
    ) -> Result<(), RoomError> {
        let (code, _) = self.seat_for(peer, room_id, claimed)?;
        let room = self.rooms.get_mut(&code).ok_or(RoomError::NotInRoom)?;
        room.use_power(peer, pos)?;
        let opponent = room.opponent_of(peer);

        debug!(room = %code, peer, row = pos.row, col = pos.col, "bomb used");
        self.relay(
            peer,
            opponent,
            ServerMessage::PowerUsed {
                row: pos.row,
                col: pos.col,
            },
            out,
        );
        Ok(())
    }

    fn report_win(
        &mut self,
        peer: PeerId,
        winner: Role,
        out: &mut Vec<Outbound>,
    ) -> Result<(), RoomError> {
        let (code, role) = self.connections.seat_of(peer).ok_or(RoomError::NotInRoom)?;
        if role != winner {
            return Err(RoomError::RoleMismatch);
        }

        let room = self.rooms.get_mut(&code).ok_or(RoomError::NotInRoom)?;
        if room.report_win(winner)? {
            info!(room = %code, winner = winner.number(), "win reported by client");
            self.record_result(winner, out);
        }
        Ok(())
    }

    fn restart(
        &mut self,
        peer: PeerId,
        room_id: &str,
        out: &mut Vec<Outbound>,
    ) -> Result<(), RoomError> {
        let (code, _) = self.connections.seat_of(peer).ok_or(RoomError::NotInRoom)?;
        if normalize_code(room_id) != code {
            return Err(RoomError::NotInRoom);
        }

        let room = self.rooms.get_mut(&code).ok_or(RoomError::NotInRoom)?;
        room.restart();
        debug!(room = %code, status = room.status.as_str(), "room restarted");
        self.to_room(&code, ServerMessage::RestartGame, out);
        Ok(())
    }

    /// Vacate `peer`'s seat, telling any remaining opponent.
    fn vacate(&mut self, peer: PeerId, out: &mut Vec<Outbound>) {
        let Some((code, _)) = self.connections.unseat(peer) else {
            return;
        };
        if let Some(remaining) = self.rooms.leave(&code, peer) {
            out.push(Outbound::to_peer(remaining, ServerMessage::OpponentLeft));
        }
    }

    fn take_seat(&mut self, peer: PeerId, code: &str, role: Role) {
        if let Err(err) = self.connections.seat(peer, code.to_string(), role) {
            warn!(peer, room = %code, %err, "seat bookkeeping out of sync");
        }
    }

    /// The peer's seat, checked against what the request claims.
    fn seat_for(
        &self,
        peer: PeerId,
        room_id: &str,
        claimed: Role,
    ) -> Result<(String, Role), RoomError> {
        let (code, role) = self.connections.seat_of(peer).ok_or(RoomError::NotInRoom)?;
        if normalize_code(room_id) != code {
            return Err(RoomError::NotInRoom);
        }
        if claimed != role {
            return Err(RoomError::RoleMismatch);
        }
        Ok((code, role))
    }

    fn relay(
        &self,
        sender: PeerId,
        opponent: Option<PeerId>,
        message: ServerMessage,
        out: &mut Vec<Outbound>,
    ) {
        if self.options.echo_to_sender {
            out.push(Outbound::to_peer(sender, message.clone()));
        }
        if let Some(opponent) = opponent {
            out.push(Outbound::to_peer(opponent, message));
        }
    }

    fn to_room(&self, code: &str, message: ServerMessage, out: &mut Vec<Outbound>) {
        let Some(room) = self.rooms.get(code) else {
            return;
        };
        out.extend(
            room.peers()
                .into_iter()
                .map(|peer| Outbound::to_peer(peer, message.clone())),
        );
    }

    fn record_result(&mut self, winner: Role, out: &mut Vec<Outbound>) {
        let snapshot = self.leaderboard.record_result(winner);
        info!(
            p1_wins = snapshot.p1_wins,
            p2_wins = snapshot.p2_wins,
            matches = snapshot.matches_played,
            "leaderboard updated"
        );
        out.push(Outbound::to_all(ServerMessage::UpdateLeaderboard(snapshot)));
    }
}
