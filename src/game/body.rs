//! Kinematic bodies: player capsules and dynamic spheres

use glam::Vec3;

/// Player capsule radius
pub const PLAYER_RADIUS: f32 = 0.35;
/// Standing height (eye point above the feet)
pub const PLAYER_HEIGHT: f32 = 1.66;
/// Spawn pose of the capsule bottom endpoint
pub const SPAWN_START: Vec3 = Vec3::new(-5.0, PLAYER_RADIUS, 5.0);
/// Spawn pose of the capsule top endpoint
pub const SPAWN_END: Vec3 = Vec3::new(-5.0, PLAYER_HEIGHT, 5.0);

/// Default dynamic sphere radius
pub const SPHERE_RADIUS: f32 = 0.2;
/// Where pooled spheres wait before their first throw
pub const SPHERE_PARKING: Vec3 = Vec3::new(0.0, -100.0, 0.0);

/// Id carried by the local player until the hub assigns one
pub const UNASSIGNED_PLAYER_ID: &str = "single";

/// Swept-sphere collider between two endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl Capsule {
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self { start, end, radius }
    }

    /// Player capsule at the spawn pose
    pub fn spawn() -> Self {
        Self::new(SPAWN_START, SPAWN_END, PLAYER_RADIUS)
    }

    /// Move both endpoints; the shape never rescales
    pub fn translate(&mut self, offset: Vec3) {
        self.start += offset;
        self.end += offset;
    }

    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// Place the top endpoint at `end`, keeping the segment length
    pub fn set_end(&mut self, end: Vec3) {
        let offset = end - self.end;
        self.translate(offset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// A player, local or remote
#[derive(Debug, Clone)]
pub struct Player {
    pub player_id: String,
    pub player_name: String,
    pub collider: Capsule,
    pub velocity: Vec3,
    /// Euler angles: x = pitch, y = yaw, z = roll
    pub orientation: Vec3,
    /// Look vector
    pub direction: Vec3,
    pub on_floor: bool,
    pub is_lead: bool,
}

impl Player {
    pub fn new(player_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
            collider: Capsule::spawn(),
            velocity: Vec3::ZERO,
            orientation: Vec3::ZERO,
            direction: Vec3::ZERO,
            on_floor: false,
            is_lead: false,
        }
    }

    /// Put the capsule back at the spawn pose
    pub fn reset_collider(&mut self) {
        self.collider = Capsule::spawn();
    }

    /// Feet position derived from the capsule top
    pub fn position(&self) -> Vec3 {
        self.collider.end - Vec3::new(0.0, PLAYER_HEIGHT, 0.0)
    }

    pub fn eye(&self) -> Vec3 {
        self.collider.end
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Dynamic sphere; simulated locally, never sent over the network
#[derive(Debug, Clone)]
pub struct DynamicSphere {
    pub collider: SphereCollider,
    pub velocity: Vec3,
}

impl DynamicSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            collider: SphereCollider::new(center, radius),
            velocity: Vec3::ZERO,
        }
    }

    /// A sphere parked out of the world until it is thrown
    pub fn parked() -> Self {
        Self::new(SPHERE_PARKING, SPHERE_RADIUS)
    }
}
