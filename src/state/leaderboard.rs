//! Global win counters.

use serde::{Deserialize, Serialize};

use super::board::Role;

/// Point-in-time copy of the counters, as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    pub p1_wins: u64,
    pub p2_wins: u64,
    pub matches_played: u64,
}

/// Process-wide counters. Only ever grow.
#[derive(Debug, Default)]
pub struct Leaderboard {
    snapshot: LeaderboardSnapshot,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed match won by `winner`.
    pub fn record_result(&mut self, winner: Role) -> LeaderboardSnapshot {
        match winner {
            Role::PlayerOne => self.snapshot.p1_wins += 1,
            Role::PlayerTwo => self.snapshot.p2_wins += 1,
        }
        self.snapshot.matches_played += 1;
        self.snapshot
    }

    pub fn snapshot(&self) -> LeaderboardSnapshot {
        self.snapshot
    }
}
