//! Connection state management.
//!
//! Tracks transport sessions and the room seat each one holds. A peer that
//! reconnects gets a new identifier and starts unseated.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::board::Role;
use super::peer::{InvalidTransition, PeerEvent, PeerState};
use super::PeerId;

/// Connection state for a single peer.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Transport-assigned identifier
    pub peer_id: PeerId,

    /// Location state machine
    pub state: PeerState,

    /// When this connection was established
    pub connected_at: chrono::DateTime<chrono::Utc>,

    /// Last inbound message
    pub last_activity: Instant,

    /// Inbound messages handled
    pub messages_received: u64,
}

impl Connection {
    /// Create a new connected peer.
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            state: PeerState::connected(),
            connected_at: chrono::Utc::now(),
            last_activity: Instant::now(),
            messages_received: 0,
        }
    }

    /// Record activity (any message received).
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
        self.messages_received += 1;
    }

    /// Get time since last activity.
    pub fn idle_time(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Room code and role, if seated.
    pub fn seat(&self) -> Option<(&str, Role)> {
        Some((self.state.room_code()?, self.state.role()?))
    }
}

/// Connection manager - tracks all connected peers.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: HashMap<PeerId, Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new connection.
    pub fn add(&mut self, conn: Connection) {
        self.connections.insert(conn.peer_id, conn);
    }

    /// Get a connection by peer ID.
    pub fn get(&self, peer_id: PeerId) -> Option<&Connection> {
        self.connections.get(&peer_id)
    }

    /// Get a mutable connection by peer ID.
    pub fn get_mut(&mut self, peer_id: PeerId) -> Option<&mut Connection> {
        self.connections.get_mut(&peer_id)
    }

    /// Remove a connection.
    pub fn remove(&mut self, peer_id: PeerId) -> Option<Connection> {
        self.connections.remove(&peer_id)
    }

    pub fn contains(&self, peer_id: PeerId) -> bool {
        self.connections.contains_key(&peer_id)
    }

    /// Room code and role held by a peer.
    pub fn seat_of(&self, peer_id: PeerId) -> Option<(String, Role)> {
        self.connections
            .get(&peer_id)?
            .seat()
            .map(|(code, role)| (code.to_string(), role))
    }

    /// Record that a peer now sits in `room_code`.
    pub fn seat(
        &mut self,
        peer_id: PeerId,
        room_code: String,
        role: Role,
    ) -> Result<(), InvalidTransition> {
        let Some(conn) = self.connections.get_mut(&peer_id) else {
            return Ok(());
        };
        conn.state.apply_mut(PeerEvent::EnterRoom { room_code, role })
    }

    /// Clear a peer's seat. Returns the seat they held.
    pub fn unseat(&mut self, peer_id: PeerId) -> Option<(String, Role)> {
        let conn = self.connections.get_mut(&peer_id)?;
        let seat = conn.seat().map(|(code, role)| (code.to_string(), role))?;
        conn.state.apply_mut(PeerEvent::LeaveRoom).ok()?;
        Some(seat)
    }

    /// All connected peer IDs, in ascending order.
    pub fn peer_ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Count connected peers.
    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }

    /// Count peers holding a seat.
    pub fn seated_count(&self) -> usize {
        self.connections
            .values()
            .filter(|c| c.state.is_in_room())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_new() {
        let conn = Connection::new(1);
        assert!(conn.state.is_connected());
        assert_eq!(*conn.state.location(), crate::state::PeerLocation::Connected);
        assert_eq!(conn.seat(), None);
        assert_eq!(conn.messages_received, 0);
    }

    #[test]
    fn test_touch_counts_messages() {
        let mut conn = Connection::new(1);
        conn.touch();
        conn.touch();
        assert_eq!(conn.messages_received, 2);
        assert!(conn.idle_time() < Duration::from_secs(5));
    }

    #[test]
    fn test_manager_seat_and_unseat() {
        let mut manager = ConnectionManager::new();
        manager.add(Connection::new(1));

        manager.seat(1, "ABCDE".to_string(), Role::PlayerOne).unwrap();
        assert_eq!(manager.seat_of(1), Some(("ABCDE".to_string(), Role::PlayerOne)));
        assert_eq!(manager.seated_count(), 1);

        assert!(manager.seat(1, "FGHIJ".to_string(), Role::PlayerTwo).is_err());

        assert_eq!(manager.unseat(1), Some(("ABCDE".to_string(), Role::PlayerOne)));
        assert_eq!(manager.unseat(1), None);
        assert_eq!(manager.seat_of(1), None);
    }

    #[test]
    fn test_manager_unknown_peer() {
        let mut manager = ConnectionManager::new();
        assert!(manager.seat(9, "ABCDE".to_string(), Role::PlayerOne).is_ok());
        assert_eq!(manager.unseat(9), None);
        assert!(manager.get(9).is_none());
    }

    #[test]
    fn test_manager_peer_ids_sorted() {
        let mut manager = ConnectionManager::new();
        for id in [5, 2, 9] {
            manager.add(Connection::new(id));
        }
        assert_eq!(manager.peer_ids(), vec![2, 5, 9]);
        assert_eq!(manager.connected_count(), 3);

        manager.remove(5);
        assert!(!manager.contains(5));
        assert_eq!(manager.connected_count(), 2);
    }
}
