//! Per-frame simulation: local player, remote puppets and dynamic spheres

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::Config;
use crate::net::protocol::{RosterState, ShotEvent, StateSnapshot};
use crate::util::time::{substep_delta, STEPS_PER_FRAME};

use super::body::{DynamicSphere, Player, UNASSIGNED_PLAYER_ID};
use super::input::{Camera, MovementKeys};
use super::physics::{MovementTuning, PhysicsSystem, SphereTuning};
use super::roster::{Roster, RosterDiff, RosterHooks};
use super::snapshot::{ShotQueue, SnapshotBuilder};
use super::world::SpatialQuery;

/// Eye height at or below which the local player is sent back to spawn
pub const OUT_OF_BOUNDS_Y: f32 = -25.0;

/// Tunables for a simulation instance
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub player_name: String,
    pub gravity: f32,
    pub sphere_count: usize,
    pub seed: u64,
    pub movement: MovementTuning,
    pub spheres: SphereTuning,
}

impl SimulationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            player_name: config.player_name.clone(),
            gravity: config.gravity,
            sphere_count: config.sphere_count,
            seed: config.sim_seed,
            ..Self::default()
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            player_name: "Your Name".to_string(),
            gravity: 9.8,
            sphere_count: 0,
            seed: 0,
            movement: MovementTuning::default(),
            spheres: SphereTuning::default(),
        }
    }
}

/// What a frame step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A collaborator (world or camera) is not attached yet
    Skipped,
    Stepped {
        substeps: u32,
        /// The local player fell out of the world and was reset to spawn
        respawned: bool,
    },
}

/// Client-side simulation state (owned by the frame loop, shared with the network tasks)
pub struct Simulation {
    local: Player,
    roster: Roster,
    spheres: Vec<DynamicSphere>,
    next_sphere: usize,
    shots: ShotQueue,
    world: Option<Arc<dyn SpatialQuery>>,
    camera: Option<Camera>,
    settings: SimulationSettings,
    rng: ChaCha8Rng,
    frame: u64,
}

impl Simulation {
    pub fn new(settings: SimulationSettings) -> Self {
        let spheres = (0..settings.sphere_count)
            .map(|_| DynamicSphere::parked())
            .collect();

        Self {
            local: Player::new(UNASSIGNED_PLAYER_ID, settings.player_name.clone()),
            roster: Roster::new(),
            spheres,
            next_sphere: 0,
            shots: ShotQueue::new(),
            world: None,
            camera: None,
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            settings,
            frame: 0,
        }
    }

    pub fn attach_world(&mut self, world: Arc<dyn SpatialQuery>) {
        self.world = Some(world);
    }

    /// Attach the camera and place it at the local player's eye
    pub fn attach_camera(&mut self, mut camera: Camera) {
        camera.position = self.local.eye();
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    /// Identity assigned by the hub handshake
    pub fn assign_identity(&mut self, player_id: &str, is_lead: bool) {
        self.local.player_id = player_id.to_string();
        self.local.is_lead = is_lead;
        info!(player_id = %player_id, is_lead, "Local identity assigned");
    }

    pub fn local(&self) -> &Player {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut Player {
        &mut self.local
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn spheres(&self) -> &[DynamicSphere] {
        &self.spheres
    }

    pub fn pending_shots(&self) -> usize {
        self.shots.len()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance one rendered frame in fixed substeps
    pub fn step(&mut self, frame_delta: f32, keys: &MovementKeys) -> StepOutcome {
        let (Some(world), Some(mut camera)) = (self.world.clone(), self.camera) else {
            return StepOutcome::Skipped;
        };

        let dt = substep_delta(frame_delta);
        let intent = keys.intent(&camera);
        let gravity = self.settings.gravity;
        let movement = self.settings.movement;
        let sphere_tuning = self.settings.spheres;

        for _ in 0..STEPS_PER_FRAME {
            PhysicsSystem::apply_intent(&mut self.local, &intent, dt, &movement);
            self.local.orientation = camera.orientation();
            self.local.direction = camera.forward();
            PhysicsSystem::integrate_player(&mut self.local, dt, gravity, &movement);
            PhysicsSystem::resolve_player_world(&mut self.local, &*world);

            // Remote players are puppets of the hub: no gravity, no floor
            for remote in self.roster.bodies_mut() {
                PhysicsSystem::integrate_player(remote, dt, 0.0, &movement);
            }

            camera.position = self.local.eye();

            for sphere in self.spheres.iter_mut() {
                PhysicsSystem::update_sphere(sphere, &*world, dt, gravity, &sphere_tuning);
                PhysicsSystem::resolve_player_sphere(&mut self.local, sphere);
            }
            PhysicsSystem::resolve_sphere_pairs(&mut self.spheres);
        }

        let respawned = self.local.eye().y <= OUT_OF_BOUNDS_Y;
        if respawned {
            debug!(player_id = %self.local.player_id, "Player out of bounds, respawning");
            self.local.reset_collider();
            camera.position = self.local.eye();
            camera.reset_rotation();
        }

        self.camera = Some(camera);
        self.frame += 1;

        StepOutcome::Stepped {
            substeps: STEPS_PER_FRAME,
            respawned,
        }
    }

    /// Fire from the camera; the shot rides along with the next snapshot
    pub fn shoot(&mut self) -> Option<ShotEvent> {
        let camera = self.camera?;
        let shot = ShotEvent {
            origin: camera.position.into(),
            direction: camera.forward().into(),
            tag: self.rng.gen_range(0..0xFF_FFFF) as f64,
        };
        self.shots.push(shot);
        Some(shot)
    }

    /// Throw the next pooled sphere along the look direction
    ///
    /// Holding the throw longer gives a stronger impulse.
    pub fn throw_sphere(&mut self, held: Duration) -> bool {
        let Some(camera) = self.camera else {
            return false;
        };
        if self.spheres.is_empty() {
            return false;
        }

        let direction = camera.forward();
        self.local.direction = direction;
        let impulse = 15.0 + 30.0 * (1.0 - (-held.as_secs_f32()).exp());

        let sphere = &mut self.spheres[self.next_sphere];
        sphere.collider.center =
            self.local.eye() + direction * (self.local.collider.radius * 1.5);
        sphere.velocity = direction * impulse + self.local.velocity * 2.0;

        self.next_sphere = (self.next_sphere + 1) % self.spheres.len();
        true
    }

    /// Local snapshot for the send loop; drains the shot queue
    pub fn build_snapshot(&mut self) -> StateSnapshot {
        SnapshotBuilder::build(&self.local, &mut self.shots)
    }

    /// Apply a roster tick from the hub
    pub fn apply_roster(&mut self, state: &RosterState, hooks: &mut dyn RosterHooks) -> RosterDiff {
        self.roster.apply_snapshot(state, &self.local.player_id, hooks)
    }

    /// Forget every remote player (session ended)
    pub fn clear_roster(&mut self, hooks: &mut dyn RosterHooks) {
        self.roster.clear(hooks);
    }

    /// Teleport the local player so its eye sits at `eye`
    pub fn place_local(&mut self, eye: Vec3) {
        self.local.collider.set_end(eye);
        if let Some(camera) = self.camera.as_mut() {
            camera.position = eye;
        }
    }
}
