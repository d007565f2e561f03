//! Local snapshot building and the outgoing shot queue

use tracing::trace;

use crate::net::protocol::{ShotEvent, StateSnapshot};

use super::body::Player;

/// Shots generated locally and not yet sent
#[derive(Debug, Default)]
pub struct ShotQueue {
    pending: Vec<ShotEvent>,
}

impl ShotQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shot: ShotEvent) {
        self.pending.push(shot);
    }

    /// Take every queued shot; each shot is handed out at most once
    pub fn drain(&mut self) -> Vec<ShotEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Builds the local player's outgoing snapshot
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Capture the player's state and embed the queued shots, clearing the queue
    pub fn build(player: &Player, shots: &mut ShotQueue) -> StateSnapshot {
        let events = shots.drain();
        if !events.is_empty() {
            trace!(player_id = %player.player_id, shots = events.len(), "Embedding shots");
        }

        StateSnapshot {
            player_id: player.player_id.clone(),
            player_name: player.player_name.clone(),
            position: player.eye().into(),
            velocity: player.velocity.into(),
            orientation: player.orientation.into(),
            direction: player.direction.into(),
            events,
        }
    }
}

/// Outbound snapshot stats for debugging
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
    pub total_shots: u64,
    pub avg_bytes_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, shots: usize, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;
        self.total_shots += shots as u64;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_bytes_per_snapshot =
            self.avg_bytes_per_snapshot * ((n - 1.0) / n) + (bytes as f32 / n);
    }
}
