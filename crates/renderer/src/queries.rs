//! Terrain queries shared with gameplay: water, slope and landing checks.
//!
//! These read the same wrapped cells the raycaster draws, so what the player
//! sees and what collision/landing logic uses never disagree.

use procgen::Heightmap;

/// Blue channel must exceed this for a color to count as water.
pub const WATER_BLUE_MIN: u8 = 110;
/// Blue must lead both red and green by more than this.
pub const WATER_BLUE_MARGIN: i32 = 20;
/// Default steepest slope (height units between neighbouring cells) a
/// helicopter can settle on.
pub const DEFAULT_MAX_LANDING_SLOPE: f32 = 6.0;

/// Whether a sampled terrain color is water.
#[inline]
pub fn is_water_at(r: u8, g: u8, b: u8) -> bool {
    let b_i = b as i32;
    b > WATER_BLUE_MIN && b_i > r as i32 + WATER_BLUE_MARGIN && b_i > g as i32 + WATER_BLUE_MARGIN
}

/// Largest absolute deviation of the neighbour heights from the centre height.
///
/// `samples[0]` is the centre, the rest are its neighbours. A lone centre (or an
/// empty slice) is flat.
pub fn estimate_slope_from_samples(samples: &[f32]) -> f32 {
    match samples.split_first() {
        Some((center, neighbours)) => neighbours
            .iter()
            .map(|h| (h - center).abs())
            .fold(0.0, f32::max),
        None => 0.0,
    }
}

/// Interpolated ground height under a world point.
#[inline]
pub fn terrain_height_at(map: &Heightmap, x: f32, y: f32) -> f32 {
    map.sample_height(x, y)
}

/// Slope at the cell under `(x, y)` from its four wrapped neighbours.
pub fn slope_at(map: &Heightmap, x: f32, y: f32) -> f32 {
    let (ix, iy) = (x.floor() as i32, y.floor() as i32);
    let h = |dx: i32, dy: i32| map.height_at_cell(ix + dx, iy + dy) as f32;
    estimate_slope_from_samples(&[h(0, 0), h(-1, 0), h(1, 0), h(0, -1), h(0, 1)])
}

/// Whether the cell under `(x, y)` is water.
#[inline]
pub fn water_at(map: &Heightmap, x: f32, y: f32) -> bool {
    let [r, g, b] = map.color_at(x, y);
    is_water_at(r, g, b)
}

/// Outcome of a landing or placement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingSurface {
    Clear,
    Water,
    TooSteep,
}

impl LandingSurface {
    pub fn is_clear(self) -> bool {
        self == LandingSurface::Clear
    }
}

/// Can a craft set down (or a unit be placed) at `(x, y)`? Water wins over slope.
pub fn landing_check(map: &Heightmap, x: f32, y: f32, max_slope: f32) -> LandingSurface {
    if water_at(map, x, y) {
        LandingSurface::Water
    } else if slope_at(map, x, y) > max_slope {
        LandingSurface::TooSteep
    } else {
        LandingSurface::Clear
    }
}
