//! Camera for the voxel-space view.

use engine_core::Position;
use glam::Vec2;

/// Pinhole camera riding on a world position.
///
/// Heading rotates the view frustum on the map plane; pitch moves the horizon
/// line up or down (the classic voxel-space shear, not a true rotation).
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Camera placement. `z` is the eye altitude.
    pub position: Position,
    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,
    /// Nearest distance the ray march starts at.
    pub near: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Position::default(),
            fov_degrees: 90.0,
            near: 1.0,
        }
    }
}

impl Camera {
    /// Create a new camera at the given position.
    pub fn new(position: Position) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Half-width of the frustum per unit of forward distance.
    pub fn half_width_factor(&self) -> f32 {
        (self.fov_degrees.to_radians() * 0.5).tan()
    }

    /// Pixels per world unit at unit distance, shared by both screen axes so
    /// terrain and projected entities line up.
    pub fn focal_length(&self, screen_width: u32) -> f32 {
        screen_width as f32 * 0.5 / self.half_width_factor().max(1e-3)
    }

    /// Screen row of the horizon for the current pitch (positive pitch looks up).
    pub fn horizon(&self, screen_width: u32, screen_height: u32) -> f32 {
        screen_height as f32 * 0.5 + self.position.pitch.tan() * self.focal_length(screen_width)
    }

    /// Unit forward vector on the map plane.
    pub fn forward(&self) -> Vec2 {
        self.position.forward()
    }

    /// Unit vector toward the right-hand screen edge.
    pub fn right(&self) -> Vec2 {
        let f = self.forward();
        Vec2::new(f.y, -f.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_is_clockwise_of_forward() {
        let cam = Camera::new(Position::new(0.0, 0.0, 100.0));
        let r = cam.right();
        assert!((r.x - 0.0).abs() < 1e-6);
        assert!((r.y - -1.0).abs() < 1e-6);
    }

    #[test]
    fn level_camera_has_centered_horizon() {
        let cam = Camera::default();
        assert!((cam.horizon(320, 200) - 100.0).abs() < 1e-4);
        // 90 degree fov: half the screen width per unit distance.
        assert!((cam.focal_length(320) - 160.0).abs() < 1e-2);
    }

    #[test]
    fn looking_up_lowers_horizon() {
        let mut cam = Camera::default();
        cam.position.pitch = 0.2;
        assert!(cam.horizon(320, 200) > 100.0);
    }
}
