//! Software view of a running mission: terrain, unit markers and the radar.

use engine_core::{Faction, Position, WorldConfig};
use renderer::{cull_by_distance, project_point, Camera, Frame, RenderSettings, RenderStats, Rgba, TerrainRenderer};

use crate::entity::Unit;
use crate::radar::ContactType;
use crate::sim::Simulation;

/// Camera pitch while flying, looking slightly down.
const FLIGHT_PITCH: f32 = -0.12;
const RADAR_MARGIN: f32 = 8.0;
const RADAR_BACKGROUND: [u8; 3] = [10, 30, 14];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewStats {
    pub terrain: RenderStats,
    pub markers: u32,
    pub blips: u32,
}

pub struct GameView {
    renderer: TerrainRenderer,
    frame: Frame,
}

impl GameView {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            renderer: TerrainRenderer::new(RenderSettings::default()),
            frame: Frame::new(width, height),
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Render the player's view of `sim` into the internal frame.
    pub fn draw(&mut self, sim: &Simulation) -> ViewStats {
        let config = weather_config(sim.config(), sim.mission().weather.visibility());
        let mut eye = sim.player.position;
        if sim.player.mode.is_airborne() {
            eye.pitch = FLIGHT_PITCH;
        }
        let camera = Camera::new(eye);

        let terrain = self.renderer.render(sim.map(), &camera, &config, &mut self.frame);
        let markers = self.draw_markers(sim, &camera, &config);
        let blips = self.draw_radar(sim);
        ViewStats {
            terrain,
            markers,
            blips,
        }
    }

    fn draw_markers(&mut self, sim: &Simulation, camera: &Camera, config: &WorldConfig) -> u32 {
        let units: Vec<(Faction, engine_core::Vec3)> = sim
            .world
            .query::<(&Position, &Unit)>()
            .iter()
            .filter(|(_, (_, u))| u.alive)
            .map(|(_, (p, u))| (u.faction, p.xyz()))
            .collect();

        let (w, h) = (self.frame.width(), self.frame.height());
        let mut drawn = 0;
        for (faction, point, _) in cull_by_distance(units, camera, config) {
            let Some(screen) = project_point(camera, w, h, point, config) else {
                continue;
            };
            // Shrinks with distance, never below a pixel or two.
            let half = (200.0 / screen.depth).clamp(1.5, 6.0);
            let color = match faction {
                Faction::Hostile => ContactType::Hostile.color(),
                Faction::Friendly => ContactType::Friendly.color(),
            };
            self.frame.fill_square(screen.x, screen.y, half, Rgba::opaque(color));
            drawn += 1;
        }
        drawn
    }

    /// Scope in the bottom-left corner.
    fn draw_radar(&mut self, sim: &Simulation) -> u32 {
        let size = sim.config().radar_size;
        let half = size * 0.5;
        let cx = RADAR_MARGIN + half;
        let cy = self.frame.height() as f32 - RADAR_MARGIN - half;
        self.frame.fill_square(cx, cy, half, Rgba::opaque(RADAR_BACKGROUND));

        let contacts = sim.radar_contacts();
        for contact in &contacts {
            // Scope +y is ahead, screen +y is down.
            let x = cx + contact.offset.x;
            let y = cy - contact.offset.y;
            self.frame.fill_square(x, y, 1.0, Rgba::opaque(contact.contact_type.color()));
        }
        self.frame.fill_square(cx, cy, 1.0, Rgba::opaque([255, 255, 255]));
        contacts.len() as u32
    }
}

/// Shorten the view and pull the fog in for bad weather.
fn weather_config(config: &WorldConfig, visibility: f32) -> WorldConfig {
    let v = visibility.clamp(0.1, 1.0);
    WorldConfig {
        render_distance: config.render_distance * v,
        fog_start: config.fog_start * v,
        ..config.clone()
    }
}
