//! Locomotion and collision response
//!
//! Everything here runs once per substep. The capsule resolver must run after
//! the locomotion step so its floor state feeds the next substep's acceleration.

use glam::Vec3;

use super::body::{DynamicSphere, Player};
use super::world::{Contact, SpatialQuery};
use super::MovementIntent;

/// Player movement constants
#[derive(Debug, Clone, Copy)]
pub struct MovementTuning {
    /// Acceleration scale while on the floor
    pub ground_accel: f32,
    /// Acceleration scale while airborne
    pub air_accel: f32,
    /// Exponential damping rate
    pub damping_rate: f32,
    /// Damping multiplier while airborne
    pub air_damping_scale: f32,
    /// Vertical speed set by a jump
    pub jump_speed: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            ground_accel: 25.0,
            air_accel: 8.0,
            damping_rate: 4.0,
            air_damping_scale: 0.1,
            jump_speed: 15.0,
        }
    }
}

/// Dynamic sphere constants
#[derive(Debug, Clone, Copy)]
pub struct SphereTuning {
    /// Multiplier on the removed normal velocity when hitting geometry
    pub restitution: f32,
    pub damping_rate: f32,
}

impl Default for SphereTuning {
    fn default() -> Self {
        Self {
            restitution: 1.5,
            damping_rate: 1.5,
        }
    }
}

/// Physics system for player and sphere integration
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Apply movement intent to velocity; air control is weaker than ground control
    pub fn apply_intent(player: &mut Player, intent: &MovementIntent, dt: f32, tuning: &MovementTuning) {
        let accel = if player.on_floor {
            tuning.ground_accel
        } else {
            tuning.air_accel
        };
        player.velocity += intent.wish * (dt * accel);

        if player.on_floor && intent.jump {
            player.velocity.y = tuning.jump_speed;
        }
    }

    /// Gravity, damping and position integration for one substep
    pub fn integrate_player(player: &mut Player, dt: f32, gravity: f32, tuning: &MovementTuning) {
        let mut damping = (-tuning.damping_rate * dt).exp() - 1.0;
        if !player.on_floor {
            player.velocity.y -= gravity * dt;
            damping *= tuning.air_damping_scale;
        }
        player.velocity += player.velocity * damping;

        let delta = player.velocity * dt;
        player.collider.translate(delta);
    }

    /// Resolve the player capsule against static geometry
    pub fn resolve_player_world(player: &mut Player, world: &dyn SpatialQuery) {
        let contact = world.intersect_capsule(&player.collider);
        Self::apply_capsule_contact(player, contact);
    }

    /// Apply a (possibly absent) capsule contact
    ///
    /// Floor contacts keep the velocity; anything else slides along the surface.
    /// The capsule is always pushed out of penetration.
    pub fn apply_capsule_contact(player: &mut Player, contact: Option<Contact>) {
        player.on_floor = false;
        let Some(contact) = contact else {
            return;
        };

        player.on_floor = contact.normal.y > 0.0;
        if !player.on_floor {
            player.velocity -= contact.normal * contact.normal.dot(player.velocity);
        }
        player.collider.translate(contact.normal * contact.depth);
    }

    /// Integrate a sphere and bounce it off static geometry
    pub fn update_sphere(
        sphere: &mut DynamicSphere,
        world: &dyn SpatialQuery,
        dt: f32,
        gravity: f32,
        tuning: &SphereTuning,
    ) {
        sphere.collider.center += sphere.velocity * dt;

        match world.intersect_sphere(&sphere.collider) {
            Some(contact) => {
                sphere.velocity -=
                    contact.normal * (contact.normal.dot(sphere.velocity) * tuning.restitution);
                sphere.collider.center += contact.normal * contact.depth;
            }
            None => {
                sphere.velocity.y -= gravity * dt;
            }
        }

        let damping = (-tuning.damping_rate * dt).exp() - 1.0;
        sphere.velocity += sphere.velocity * damping;
    }

    /// Elastic equal-mass collision between two spheres
    ///
    /// Returns true if they overlapped.
    pub fn resolve_sphere_pair(a: &mut DynamicSphere, b: &mut DynamicSphere) -> bool {
        let r = a.collider.radius + b.collider.radius;
        let d2 = a.collider.center.distance_squared(b.collider.center);
        if d2 >= r * r {
            return false;
        }

        let normal = contact_normal(a.collider.center, b.collider.center);
        exchange_normal_velocity(&mut a.velocity, &mut b.velocity, normal);

        let push = (r - d2.sqrt()) / 2.0;
        a.collider.center += normal * push;
        b.collider.center -= normal * push;
        true
    }

    /// Resolve every unordered sphere pair once
    pub fn resolve_sphere_pairs(spheres: &mut [DynamicSphere]) -> usize {
        let mut collisions = 0;
        for i in 0..spheres.len() {
            let (head, tail) = spheres.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                if Self::resolve_sphere_pair(a, b) {
                    collisions += 1;
                }
            }
        }
        collisions
    }

    /// Player vs sphere, approximating the capsule by three sample points
    ///
    /// Only the sphere is repositioned; the player is moved solely by world geometry.
    pub fn resolve_player_sphere(player: &mut Player, sphere: &mut DynamicSphere) -> bool {
        let capsule = player.collider;
        let r = capsule.radius + sphere.collider.radius;
        let r2 = r * r;
        let mut hit = false;

        for point in [capsule.start, capsule.end, capsule.center()] {
            let d2 = point.distance_squared(sphere.collider.center);
            if d2 >= r2 {
                continue;
            }
            hit = true;

            let normal = contact_normal(point, sphere.collider.center);
            exchange_normal_velocity(&mut player.velocity, &mut sphere.velocity, normal);

            let push = (r - d2.sqrt()) / 2.0;
            sphere.collider.center -= normal * push;
        }
        hit
    }
}

/// Unit normal pointing from `to` toward `from`; world up when they coincide
fn contact_normal(from: Vec3, to: Vec3) -> Vec3 {
    (from - to).try_normalize().unwrap_or(Vec3::Y)
}

/// Swap the components of two velocities along `normal`
fn exchange_normal_velocity(v1: &mut Vec3, v2: &mut Vec3, normal: Vec3) {
    let p1 = normal * normal.dot(*v1);
    let p2 = normal * normal.dot(*v2);
    *v1 += p2 - p1;
    *v2 += p1 - p2;
}
