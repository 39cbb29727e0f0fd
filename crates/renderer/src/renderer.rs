//! Voxel-space terrain raycaster.
//!
//! Front-to-back march over the heightmap: at each distance `z` a line
//! perpendicular to the view is swept across every screen column, the map cell
//! under it is sampled (wrapped through the map mask), and the projected height
//! is drawn only above that column's occlusion line. Each column keeps its own
//! running "highest pixel drawn", so nearer ridges hide farther terrain without
//! a depth buffer.

use engine_core::WorldConfig;
use glam::Vec2;
use procgen::Heightmap;

use crate::camera::Camera;
use crate::frame::{Frame, Rgba};

/// Tunables for the march and the atmosphere.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    /// Color the terrain fades into; also the sky fill.
    pub sky_color: [u8; 3],
    /// First distance step.
    pub initial_step: f32,
    /// Added to the step after every row, so far terrain is sampled coarser.
    pub step_growth: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sky_color: [150, 190, 230],
            initial_step: 1.0,
            step_growth: 0.01,
        }
    }
}

/// Per-frame counters, mostly for debug overlays and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    /// Distance rows marched.
    pub rows: u32,
    /// Vertical strips that passed the occlusion test.
    pub strips: u32,
}

/// Renders terrain frames from a heightmap.
#[derive(Debug, Clone)]
pub struct TerrainRenderer {
    pub settings: RenderSettings,
    /// Per-column occlusion line, reused between frames.
    y_buffer: Vec<f32>,
}

impl TerrainRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            y_buffer: Vec::new(),
        }
    }

    /// Fraction of fog at forward distance `z`: 0 before `fog_start`, 1 at
    /// `render_distance`.
    pub fn fog_factor(z: f32, config: &WorldConfig) -> f32 {
        if z <= config.fog_start {
            return 0.0;
        }
        let span = (config.render_distance - config.fog_start).max(f32::EPSILON);
        ((z - config.fog_start) / span).clamp(0.0, 1.0)
    }

    /// Blend a terrain color toward the sky by the fog fraction at `z`.
    pub fn apply_fog(&self, color: [u8; 3], z: f32, config: &WorldConfig) -> [u8; 3] {
        let t = Self::fog_factor(z, config);
        if t <= 0.0 {
            return color;
        }
        let sky = self.settings.sky_color;
        let mut out = [0u8; 3];
        for i in 0..3 {
            let c = color[i] as f32 + (sky[i] as f32 - color[i] as f32) * t;
            out[i] = c.round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Render one frame into `frame`.
    pub fn render(
        &mut self,
        map: &Heightmap,
        camera: &Camera,
        config: &WorldConfig,
        frame: &mut Frame,
    ) -> RenderStats {
        let width = frame.width();
        let height = frame.height();
        frame.clear(Rgba::opaque(self.settings.sky_color));

        self.y_buffer.clear();
        self.y_buffer.resize(width as usize, height as f32);

        let mut stats = RenderStats::default();
        if width == 0 || height == 0 {
            return stats;
        }

        // Fold the eye onto the base tile; keeps float precision flat no matter
        // how far the camera has flown.
        let size = map.size() as f32;
        let origin = Vec2::new(
            camera.position.x.rem_euclid(size),
            camera.position.y.rem_euclid(size),
        );
        let forward = camera.forward();
        let right = camera.right();
        let half_width = camera.half_width_factor();
        let focal = camera.focal_length(width);
        let horizon = camera.horizon(width, height);
        let altitude = camera.position.z;

        let heights = map.heights();
        let colors = map.colors();
        let mask = map.mask() as i32;
        let shift = map.shift();

        let mut z = camera.near.max(0.1);
        let mut dz = self.settings.initial_step.max(0.01);

        while z < config.render_distance {
            stats.rows += 1;
            let center = origin + forward * z;
            let span = right * (z * half_width);
            let mut p = center - span;
            let step = span * (2.0 / width as f32);
            let inv_z = focal / z;

            for column in 0..width as usize {
                let ix = (p.x.floor() as i32) & mask;
                let iy = (p.y.floor() as i32) & mask;
                let idx = ((iy << shift) + ix) as usize;

                let screen_y = (altitude - heights[idx] as f32) * inv_z + horizon;
                let occlusion = self.y_buffer[column];
                if screen_y < occlusion {
                    let color = self.apply_fog(colors[idx], z, config);
                    let (top, bottom) = strip_rows(screen_y, occlusion);
                    frame.vertical_line(column as u32, top, bottom, Rgba::opaque(color));
                    self.y_buffer[column] = screen_y;
                    stats.strips += 1;
                }
                p += step;
            }

            z += dz;
            dz += self.settings.step_growth;
        }

        stats
    }

    /// Occlusion line left by the last frame: for each column, the highest
    /// screen row terrain reached.
    pub fn occlusion_line(&self) -> &[f32] {
        &self.y_buffer
    }
}

/// Rows `[top, bottom)` for a strip from `screen_y` down to the occlusion
/// line. Both ends floor, so a strip stops where the nearer one started.
fn strip_rows(screen_y: f32, occlusion: f32) -> (i32, i32) {
    (screen_y.floor() as i32, occlusion.floor() as i32)
}

impl Default for TerrainRenderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}
