//! Static world geometry and the spatial query seam

use glam::Vec3;

use super::body::{Capsule, SphereCollider};

/// Result of a static-geometry query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector pointing out of the geometry, toward the body
    pub normal: Vec3,
    /// Penetration depth (>= 0)
    pub depth: f32,
}

/// Answers intersection queries against static world geometry.
///
/// No contact is a normal outcome and is reported as `None`.
pub trait SpatialQuery: Send + Sync {
    fn intersect_capsule(&self, capsule: &Capsule) -> Option<Contact>;
    fn intersect_sphere(&self, sphere: &SphereCollider) -> Option<Contact>;
}

/// Infinite half-space; the free side is where `normal · p >= offset`
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self {
            normal: normal.normalize(),
            offset,
        }
    }

    fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

/// Static geometry made of half-space planes
#[derive(Debug, Clone, Default)]
pub struct StaticWorld {
    planes: Vec<Plane>,
}

impl StaticWorld {
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// A single floor at y = 0
    pub fn flat_ground() -> Self {
        Self::new(vec![Plane::new(Vec3::Y, 0.0)])
    }

    /// Floor at y = 0 enclosed by four walls `half_extent` from the origin
    pub fn arena(half_extent: f32) -> Self {
        Self::new(vec![
            Plane::new(Vec3::Y, 0.0),
            Plane::new(Vec3::X, -half_extent),
            Plane::new(Vec3::NEG_X, -half_extent),
            Plane::new(Vec3::Z, -half_extent),
            Plane::new(Vec3::NEG_Z, -half_extent),
        ])
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }
}

impl SpatialQuery for StaticWorld {
    // Penetrations are resolved one plane at a time on a copy; the reported
    // contact is the combined push-out of the copy's center.
    fn intersect_capsule(&self, capsule: &Capsule) -> Option<Contact> {
        let mut resolved = *capsule;
        let mut hit = false;

        for plane in &self.planes {
            let distance = plane
                .signed_distance(resolved.start)
                .min(plane.signed_distance(resolved.end));
            if distance < resolved.radius {
                resolved.translate(plane.normal * (resolved.radius - distance));
                hit = true;
            }
        }

        if !hit {
            return None;
        }
        combined_contact(resolved.center() - capsule.center())
    }

    fn intersect_sphere(&self, sphere: &SphereCollider) -> Option<Contact> {
        let mut center = sphere.center;
        let mut hit = false;

        for plane in &self.planes {
            let distance = plane.signed_distance(center);
            if distance < sphere.radius {
                center += plane.normal * (sphere.radius - distance);
                hit = true;
            }
        }

        if !hit {
            return None;
        }
        combined_contact(center - sphere.center)
    }
}

fn combined_contact(push: Vec3) -> Option<Contact> {
    let depth = push.length();
    // Touching exactly at the surface: no usable normal, no penetration
    if depth <= f32::EPSILON {
        return None;
    }
    Some(Contact {
        normal: push / depth,
        depth,
    })
}
