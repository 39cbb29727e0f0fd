//! World-to-screen projection and render-distance culling for entity markers.
//!
//! Uses wrapped deltas, so a unit just across the map seam shows up where the
//! terrain behind it is drawn.

use engine_core::{distance_2d_wrapped, wrapped_delta_2d, WorldConfig};
use glam::{Vec2, Vec3};

use crate::camera::Camera;

/// A projected point on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Forward distance from the camera plane.
    pub depth: f32,
}

/// Project `point` for a `width × height` view. `None` when behind the near
/// plane, past the render distance, or outside the horizontal field of view.
pub fn project_point(
    camera: &Camera,
    width: u32,
    height: u32,
    point: Vec3,
    config: &WorldConfig,
) -> Option<ScreenPoint> {
    let delta = wrapped_delta_2d(camera.position.xy(), Vec2::new(point.x, point.y), config.map_size_f32());
    let depth = delta.dot(camera.forward());
    if depth < camera.near || depth >= config.render_distance {
        return None;
    }
    let lateral = delta.dot(camera.right());
    let focal = camera.focal_length(width);
    let x = width as f32 * 0.5 + lateral / depth * focal;
    if x < 0.0 || x >= width as f32 {
        return None;
    }
    let y = (camera.position.z - point.z) / depth * focal + camera.horizon(width, height);
    Some(ScreenPoint { x, y, depth })
}

/// Keep the items within render distance of the camera (wrapped), ordered far
/// to near so nearer markers paint last.
pub fn cull_by_distance<K>(
    items: impl IntoIterator<Item = (K, Vec3)>,
    camera: &Camera,
    config: &WorldConfig,
) -> Vec<(K, Vec3, f32)> {
    let eye = camera.position.xy();
    let mut visible: Vec<(K, Vec3, f32)> = items
        .into_iter()
        .filter_map(|(key, p)| {
            let d = distance_2d_wrapped(eye, Vec2::new(p.x, p.y), config.map_size_f32());
            (d < config.render_distance).then_some((key, p, d))
        })
        .collect();
    visible.sort_by(|a, b| b.2.total_cmp(&a.2));
    visible
}
