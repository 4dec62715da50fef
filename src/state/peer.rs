//! Peer state machine.
//!
//! Tracks where a connected peer is and validates transitions.
//!
//! # State Diagram
//!
//! ```text
//! ┌──────────────┐  connect   ┌───────────┐  enter_room  ┌──────────┐
//! │ Disconnected │───────────▶│ Connected │─────────────▶│  InRoom  │
//! └──────────────┘            └───────────┘◀─────────────└────┬─────┘
//!        ▲                          │        leave_room       │
//!        │         disconnect       │                         │
//!        └──────────────────────────┴─────────────────────────┘
//! ```

use std::fmt;

use super::board::Role;

/// Peer's current location in the system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PeerLocation {
    /// Transport session closed
    #[default]
    Disconnected,

    /// Connected but not seated anywhere
    Connected,

    /// Seated in a room
    InRoom { room_code: String, role: Role },
}

impl PeerLocation {
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    pub fn is_in_room(&self) -> bool {
        matches!(self, Self::InRoom { .. })
    }

    /// Get the room code if seated.
    pub fn room_code(&self) -> Option<&str> {
        match self {
            Self::InRoom { room_code, .. } => Some(room_code),
            _ => None,
        }
    }

    /// Get the role if seated.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::InRoom { role, .. } => Some(*role),
            _ => None,
        }
    }
}

impl fmt::Display for PeerLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::InRoom { room_code, role } => {
                write!(f, "InRoom({}, {})", room_code, role)
            }
        }
    }
}

/// Inputs to the peer state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Connect,
    Disconnect,
    EnterRoom { room_code: String, role: Role },
    LeaveRoom,
}

/// A rejected peer transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid transition from {from} via {event:?}: {reason}")]
pub struct InvalidTransition {
    pub from: PeerLocation,
    pub event: PeerEvent,
    pub reason: &'static str,
}

/// Peer state machine.
#[derive(Debug, Clone, Default)]
pub struct PeerState {
    location: PeerLocation,
}

impl PeerState {
    /// Create a new disconnected peer state.
    pub fn new() -> Self {
        Self::default()
    }

    /// A peer with an open transport session and no seat.
    pub fn connected() -> Self {
        Self {
            location: PeerLocation::Connected,
        }
    }

    pub fn location(&self) -> &PeerLocation {
        &self.location
    }

    /// The state after `event`, leaving `self` untouched.
    pub fn apply(&self, event: PeerEvent) -> Result<Self, InvalidTransition> {
        Ok(Self {
            location: self.transition(&event)?,
        })
    }

    /// In-place variant of [`PeerState::apply`].
    pub fn apply_mut(&mut self, event: PeerEvent) -> Result<(), InvalidTransition> {
        self.location = self.transition(&event)?;
        Ok(())
    }

    fn transition(&self, event: &PeerEvent) -> Result<PeerLocation, InvalidTransition> {
        use PeerEvent::*;
        use PeerLocation::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: self.location.clone(),
            event: event.clone(),
            reason,
        };

        match (&self.location, event) {
            (Disconnected, Connect) => Ok(Connected),
            (_, Connect) => Err(invalid("Already connected")),

            (Disconnected, Disconnect) => Err(invalid("Already disconnected")),
            (_, Disconnect) => Ok(Disconnected),

            (Connected, EnterRoom { room_code, role }) => Ok(InRoom {
                room_code: room_code.clone(),
                role: *role,
            }),
            (InRoom { .. }, EnterRoom { .. }) => Err(invalid("Must leave current room first")),
            (Disconnected, EnterRoom { .. }) => Err(invalid("Must connect first")),

            (InRoom { .. }, LeaveRoom) => Ok(Connected),
            (_, LeaveRoom) => Err(invalid("Not in a room")),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.location.is_connected()
    }

    pub fn is_in_room(&self) -> bool {
        self.location.is_in_room()
    }

    pub fn room_code(&self) -> Option<&str> {
        self.location.room_code()
    }

    pub fn role(&self) -> Option<Role> {
        self.location.role()
    }
}
