//! Camera look state and key-to-intent mapping

use glam::Vec3;

use super::MovementIntent;

/// Mouse counts per radian of look rotation
const LOOK_SENSITIVITY: f32 = 500.0;
/// Pitch stays strictly inside (-PITCH_LIMIT, PITCH_LIMIT)
const PITCH_LIMIT: f32 = 1.5;

/// First-person camera glued to the local player's eye point
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation around the world up axis
    pub yaw: f32,
    /// Rotation around the camera's side axis
    pub pitch: f32,
}

impl Camera {
    /// Apply a mouse movement delta
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx / LOOK_SENSITIVITY;
        let pitch = self.pitch - dy / LOOK_SENSITIVITY;
        if pitch > -PITCH_LIMIT && pitch < PITCH_LIMIT {
            self.pitch = pitch;
        }
    }

    /// Unit look vector; yaw 0 looks down -Z
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Horizontal unit vector pointing to the camera's right
    pub fn side(&self) -> Vec3 {
        let flat = Vec3::new(self.forward().x, 0.0, self.forward().z).normalize_or_zero();
        flat.cross(Vec3::Y)
    }

    /// Euler angles as sent on the wire (x = pitch, y = yaw)
    pub fn orientation(&self) -> Vec3 {
        Vec3::new(self.pitch, self.yaw, 0.0)
    }

    pub fn reset_rotation(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }
}

/// Movement keys held during a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl MovementKeys {
    /// Turn held keys into a world-space intent for the given camera
    pub fn intent(&self, camera: &Camera) -> MovementIntent {
        let forward = camera.forward();
        let side = camera.side();
        let mut wish = Vec3::ZERO;

        if self.forward {
            wish += forward;
        }
        if self.back {
            wish -= forward;
        }
        if self.left {
            wish -= side;
        }
        if self.right {
            wish += side;
        }

        MovementIntent {
            wish,
            jump: self.jump,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.side() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.look(0.0, -700.0);
        assert!((camera.pitch - 1.4).abs() < 1e-6);
        // Would cross the limit, rejected
        camera.look(0.0, -100.0);
        assert!((camera.pitch - 1.4).abs() < 1e-6);
        camera.look(250.0, 0.0);
        assert!((camera.yaw - -0.5).abs() < 1e-6);
    }

    #[test]
    fn test_side_ignores_pitch() {
        let mut camera = Camera::default();
        camera.look(0.0, -600.0);
        let side = camera.side();
        assert_eq!(side.y, 0.0);
        assert!((side.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_diagonal_intent_is_not_normalized() {
        let camera = Camera::default();
        let keys = MovementKeys {
            forward: true,
            right: true,
            ..Default::default()
        };
        let intent = keys.intent(&camera);
        assert!((intent.wish - Vec3::new(1.0, 0.0, -1.0)).length() < 1e-6);
        assert!(!intent.jump);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let camera = Camera::default();
        let keys = MovementKeys {
            forward: true,
            back: true,
            left: true,
            right: true,
            jump: true,
        };
        let intent = keys.intent(&camera);
        assert!(intent.wish.length() < 1e-6);
        assert!(intent.jump);
    }
}
