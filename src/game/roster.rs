//! Remote player roster and its reconciliation against hub state

use std::collections::HashMap;

use glam::Vec3;
use tracing::{debug, info};

use crate::net::protocol::{RosterState, StateSnapshot};

use super::body::Player;

/// Callbacks into the rendering/asset collaborator
pub trait RosterHooks: Send {
    /// A remote player appeared; load its assets
    fn on_remote_player_join(&mut self, player_id: &str, player_name: &str);
    /// A remote player is about to be dropped; release its assets
    fn on_remote_player_leave(&mut self, player_id: &str);
    /// Play a shot/impact effect
    fn on_impact_event(&mut self, origin: Vec3, direction: Vec3, tag: f64);
    /// The hub asked to clear transient world effects
    fn on_clear_world(&mut self) {}
}

/// Hooks that only log, for headless clients
#[derive(Debug, Default)]
pub struct LoggingHooks;

impl RosterHooks for LoggingHooks {
    fn on_remote_player_join(&mut self, player_id: &str, player_name: &str) {
        info!(player_id = %player_id, player_name = %player_name, "Remote player joined");
    }

    fn on_remote_player_leave(&mut self, player_id: &str) {
        info!(player_id = %player_id, "Remote player left");
    }

    fn on_impact_event(&mut self, origin: Vec3, direction: Vec3, tag: f64) {
        debug!(?origin, ?direction, tag, "Impact event");
    }

    fn on_clear_world(&mut self) {
        info!("World cleared");
    }
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterDiff {
    pub joined: Vec<String>,
    pub left: Vec<String>,
    pub updated: usize,
    pub impacts: usize,
}

impl RosterDiff {
    pub fn membership_changed(&self) -> bool {
        !self.joined.is_empty() || !self.left.is_empty()
    }
}

/// Remote players known to this client, keyed by player id
#[derive(Debug, Default)]
pub struct Roster {
    players: HashMap<String, Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile against an authoritative roster tick
    ///
    /// The local player is skipped. Known ids missing from `state` are treated
    /// as disconnected; their leave hook runs before the entity is dropped.
    pub fn apply_snapshot(
        &mut self,
        state: &RosterState,
        local_id: &str,
        hooks: &mut dyn RosterHooks,
    ) -> RosterDiff {
        let mut diff = RosterDiff::default();

        for (player_id, snapshot) in state {
            if player_id == local_id {
                continue;
            }

            let player = self.players.entry(player_id.clone()).or_insert_with(|| {
                hooks.on_remote_player_join(player_id, &snapshot.player_name);
                diff.joined.push(player_id.clone());
                Player::new(player_id.clone(), snapshot.player_name.clone())
            });

            overwrite_kinematics(player, snapshot);
            diff.updated += 1;

            for event in &snapshot.events {
                hooks.on_impact_event(event.origin.into(), event.direction.into(), event.tag);
                diff.impacts += 1;
            }
        }

        let departed: Vec<String> = self
            .players
            .keys()
            .filter(|id| !state.contains_key(id.as_str()))
            .cloned()
            .collect();
        for player_id in departed {
            hooks.on_remote_player_leave(&player_id);
            self.players.remove(&player_id);
            diff.left.push(player_id);
        }

        if diff.membership_changed() {
            debug!(
                joined = diff.joined.len(),
                left = diff.left.len(),
                remote_players = self.players.len(),
                "Roster membership changed"
            );
        }

        diff
    }

    /// Drop every remote player, running leave hooks
    pub fn clear(&mut self, hooks: &mut dyn RosterHooks) {
        for (player_id, _) in self.players.drain() {
            hooks.on_remote_player_leave(&player_id);
        }
    }

    pub fn get(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Kinematic access for local integration between roster ticks
    pub(crate) fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }
}

/// Last-write-wins overwrite of a remote player's mutable state
fn overwrite_kinematics(player: &mut Player, snapshot: &StateSnapshot) {
    player.player_name.clone_from(&snapshot.player_name);
    player.collider.set_end(snapshot.position.into());
    player.velocity = snapshot.velocity.into();
    player.orientation = snapshot.orientation.into();
    player.direction = snapshot.direction.into();
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::net::protocol::{ShotEvent, WireVec3};

    /// Hooks that record every call
    #[derive(Debug, Default)]
    pub(crate) struct RecordingHooks {
        pub joins: Vec<String>,
        pub leaves: Vec<String>,
        pub impacts: Vec<f64>,
        pub clears: usize,
    }

    impl RosterHooks for RecordingHooks {
        fn on_remote_player_join(&mut self, player_id: &str, _player_name: &str) {
            self.joins.push(player_id.to_string());
        }

        fn on_remote_player_leave(&mut self, player_id: &str) {
            self.leaves.push(player_id.to_string());
        }

        fn on_impact_event(&mut self, _origin: Vec3, _direction: Vec3, tag: f64) {
            self.impacts.push(tag);
        }

        fn on_clear_world(&mut self) {
            self.clears += 1;
        }
    }

    pub(crate) fn snapshot(player_id: &str, position: Vec3) -> StateSnapshot {
        StateSnapshot {
            player_id: player_id.to_string(),
            player_name: format!("name-{player_id}"),
            position: position.into(),
            velocity: WireVec3 { x: 1.0, y: 0.0, z: 0.0 },
            orientation: WireVec3::default(),
            direction: WireVec3 { x: 0.0, y: 0.0, z: -1.0 },
            events: Vec::new(),
        }
    }

    fn state(entries: Vec<StateSnapshot>) -> RosterState {
        entries
            .into_iter()
            .map(|s| (s.player_id.clone(), s))
            .collect()
    }

    #[test]
    fn test_new_players_join_and_update() {
        let mut roster = Roster::new();
        let mut hooks = RecordingHooks::default();
        let tick = state(vec![
            snapshot("p1", Vec3::new(1.0, 2.0, 3.0)),
            snapshot("p2", Vec3::new(4.0, 5.0, 6.0)),
        ]);

        let diff = roster.apply_snapshot(&tick, "me", &mut hooks);

        assert_eq!(diff.joined.len(), 2);
        assert_eq!(diff.updated, 2);
        assert_eq!(roster.len(), 2);
        let p1 = roster.get("p1").unwrap();
        assert_eq!(p1.collider.end, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p1.velocity, Vec3::X);
        assert_eq!(p1.player_name, "name-p1");
    }

    #[test]
    fn test_local_player_is_excluded() {
        let mut roster = Roster::new();
        let mut hooks = RecordingHooks::default();
        let tick = state(vec![snapshot("me", Vec3::ZERO), snapshot("p1", Vec3::ZERO)]);

        roster.apply_snapshot(&tick, "me", &mut hooks);

        assert!(!roster.contains("me"));
        assert_eq!(hooks.joins, vec!["p1".to_string()]);
    }

    #[test]
    fn test_repeated_snapshot_is_idempotent() {
        let mut roster = Roster::new();
        let mut hooks = RecordingHooks::default();
        let tick = state(vec![snapshot("p1", Vec3::ZERO), snapshot("p2", Vec3::ONE)]);

        roster.apply_snapshot(&tick, "me", &mut hooks);
        let second = roster.apply_snapshot(&tick, "me", &mut hooks);

        assert!(!second.membership_changed());
        assert_eq!(hooks.joins.len(), 2);
        assert!(hooks.leaves.is_empty());
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_absent_player_leaves_once() {
        let mut roster = Roster::new();
        let mut hooks = RecordingHooks::default();

        roster.apply_snapshot(&state(vec![snapshot("p1", Vec3::ZERO)]), "me", &mut hooks);
        let diff = roster.apply_snapshot(&RosterState::new(), "me", &mut hooks);
        roster.apply_snapshot(&RosterState::new(), "me", &mut hooks);

        assert_eq!(diff.left, vec!["p1".to_string()]);
        assert_eq!(hooks.leaves, vec!["p1".to_string()]);
        assert!(roster.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut roster = Roster::new();
        let mut hooks = RecordingHooks::default();

        roster.apply_snapshot(&state(vec![snapshot("p1", Vec3::new(9.0, 9.0, 9.0))]), "me", &mut hooks);
        let mut newer = snapshot("p1", Vec3::new(1.0, 1.0, 1.0));
        newer.player_name = "renamed".to_string();
        newer.orientation = WireVec3 { x: 0.1, y: 0.2, z: 0.0 };
        roster.apply_snapshot(&state(vec![newer]), "me", &mut hooks);

        let p1 = roster.get("p1").unwrap();
        assert_eq!(p1.collider.end, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(p1.player_name, "renamed");
        assert_eq!(p1.orientation, Vec3::new(0.1, 0.2, 0.0));
        assert_eq!(hooks.joins.len(), 1);
    }

    #[test]
    fn test_embedded_events_replay_once() {
        let mut roster = Roster::new();
        let mut hooks = RecordingHooks::default();
        let mut shooter = snapshot("p1", Vec3::ZERO);
        shooter.events = vec![
            ShotEvent {
                origin: WireVec3::default(),
                direction: WireVec3 { x: 0.0, y: 0.0, z: -1.0 },
                tag: 7.0,
            },
            ShotEvent {
                origin: WireVec3::default(),
                direction: WireVec3 { x: 1.0, y: 0.0, z: 0.0 },
                tag: 8.0,
            },
        ];
        // Events from the local player's own entry are not replayed
        let mut me = snapshot("me", Vec3::ZERO);
        me.events = shooter.events.clone();

        let diff = roster.apply_snapshot(&state(vec![shooter, me]), "me", &mut hooks);

        assert_eq!(diff.impacts, 2);
        assert_eq!(hooks.impacts, vec![7.0, 8.0]);
    }

    #[test]
    fn test_clear_runs_leave_hooks() {
        let mut roster = Roster::new();
        let mut hooks = RecordingHooks::default();
        roster.apply_snapshot(&state(vec![snapshot("p1", Vec3::ZERO), snapshot("p2", Vec3::ZERO)]), "me", &mut hooks);

        roster.clear(&mut hooks);

        assert!(roster.is_empty());
        assert_eq!(hooks.leaves.len(), 2);
    }
}
