//! Procedural heightmaps for maps that ship without raster assets.
//!
//! **Seed-based determinism:** every sample derives from `config.seed`, so the
//! same seed always produces the same map.
//!
//! **Seamless tiling:** the world is a torus, so noise is sampled on a 4D torus
//! (`x` and `y` each mapped onto a circle). Cells on opposite edges are
//! neighbours and the seam is invisible to the raycaster.

use std::f64::consts::TAU;

use noise::{NoiseFn, Perlin, Simplex};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::heightmap::{Heightmap, HeightmapError};

/// Derive a deterministic u32 noise seed from a world seed and an offset.
/// Same (seed, offset) always gives the same result so terrain is reproducible.
#[inline]
fn deterministic_noise_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// Configuration for procedural map generation.
#[derive(Debug, Clone)]
pub struct TerrainConfig {
    /// log2 of the map edge length.
    pub map_shift: u32,
    /// Feature frequency in cycles per map edge at the first octave.
    pub frequency: f64,
    /// Number of octaves for fractal noise.
    pub octaves: u32,
    /// Lacunarity (frequency multiplier per octave).
    pub lacunarity: f64,
    /// Persistence (amplitude multiplier per octave).
    pub persistence: f64,
    /// Seed for random generation.
    pub seed: u64,
    /// Normalised height (0-1) below which cells are flooded.
    pub water_level: f32,
    /// Strength of the baked slope lighting in the color raster.
    pub shading: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            map_shift: 10,
            frequency: 3.0,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 0,
            water_level: 0.3,
            shading: 0.04,
        }
    }
}

/// Color bands by normalised height, above the waterline.
const SAND: [u8; 3] = [196, 180, 130];
const GRASS: [u8; 3] = [72, 128, 56];
const FOREST: [u8; 3] = [44, 92, 40];
const ROCK: [u8; 3] = [120, 110, 100];
const SNOW: [u8; 3] = [236, 236, 240];
/// Open water. Blue dominant so the terrain water test picks it up.
const WATER: [u8; 3] = [30, 72, 168];

/// Generate a tileable heightmap from `config`.
pub fn generate_heightmap(config: &TerrainConfig) -> Result<Heightmap, HeightmapError> {
    let perlin = Perlin::new(deterministic_noise_seed(config.seed, 0));
    let simplex = Simplex::new(deterministic_noise_seed(config.seed, 1));
    let mut rng = StdRng::seed_from_u64(config.seed ^ 0x5eed_c010);

    let size = 1usize << config.map_shift;
    let mut normalized = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let u = x as f64 / size as f64;
            let v = y as f64 / size as f64;
            normalized.push(fractal_noise(&perlin, &simplex, u, v, config) as f32);
        }
    }

    let water = config.water_level.clamp(0.0, 1.0);
    let water_height = to_height(water);
    let mut heights = Vec::with_capacity(size * size);
    for &n in &normalized {
        heights.push(if n < water { water_height } else { to_height(n) });
    }

    let mask = size - 1;
    let mut colors = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let n = normalized[y * size + x];
            if n < water {
                colors.push(WATER);
                continue;
            }
            // Light from -x: brighten slopes facing it, darken the far side.
            let left = heights[y * size + ((x + mask) & mask)] as f32;
            let right = heights[y * size + ((x + 1) & mask)] as f32;
            let shade = (1.0 + (left - right) * config.shading).clamp(0.6, 1.4);
            let jitter = rng.gen_range(0.94..1.06);
            colors.push(scale_color(band_color(n, water), shade * jitter));
        }
    }

    log::debug!(
        "Generated {}x{} procedural map (seed {})",
        size,
        size,
        config.seed
    );
    Heightmap::from_rasters(config.map_shift, heights, colors)
}

/// Fractal noise in 0-1 at map fraction `(u, v)`, periodic in both.
fn fractal_noise(perlin: &Perlin, simplex: &Simplex, u: f64, v: f64, config: &TerrainConfig) -> f64 {
    let (su, cu) = (u * TAU).sin_cos();
    let (sv, cv) = (v * TAU).sin_cos();

    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.frequency;
    let mut max_value = 0.0;

    for _ in 0..config.octaves {
        // Radius in noise space so one loop around the torus spans `frequency` features.
        let r = frequency / TAU;
        let p = [cu * r, su * r, cv * r, sv * r];
        // Mix Perlin and Simplex for variety
        let perlin_sample = perlin.get(p);
        let simplex_sample = simplex.get([p[0] + 100.0, p[1] + 100.0, p[2], p[3]]);

        value += (perlin_sample * 0.7 + simplex_sample * 0.3) * amplitude;
        max_value += amplitude;

        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    // Normalize to 0-1 range
    ((value / max_value + 1.0) * 0.5).clamp(0.0, 1.0)
}

#[inline]
fn to_height(n: f32) -> u8 {
    (n.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn band_color(n: f32, water: f32) -> [u8; 3] {
    let t = if water < 1.0 { (n - water) / (1.0 - water) } else { 0.0 };
    match t {
        t if t < 0.05 => SAND,
        t if t < 0.35 => GRASS,
        t if t < 0.6 => FOREST,
        t if t < 0.85 => ROCK,
        _ => SNOW,
    }
}

fn scale_color(c: [u8; 3], k: f32) -> [u8; 3] {
    c.map(|ch| (ch as f32 * k).clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u64) -> TerrainConfig {
        TerrainConfig {
            map_shift: 6,
            seed,
            ..Default::default()
        }
    }

    /// Same seed must produce identical rasters (replayability).
    #[test]
    fn terrain_deterministic_same_seed() {
        let a = generate_heightmap(&small(98765)).expect("generate");
        let b = generate_heightmap(&small(98765)).expect("generate");
        assert_eq!(a.heights(), b.heights());
        assert_eq!(a.colors(), b.colors());
    }

    /// Different seeds must produce different terrain.
    #[test]
    fn terrain_different_seed_different_heights() {
        let a = generate_heightmap(&small(11111)).expect("generate");
        let b = generate_heightmap(&small(22222)).expect("generate");
        assert_ne!(a.heights(), b.heights());
    }

    #[test]
    fn terrain_has_map_dimensions() {
        let map = generate_heightmap(&small(7)).expect("generate");
        assert_eq!(map.size(), 64);
        assert_eq!(map.heights().len(), 64 * 64);
        assert_eq!(map.colors().len(), 64 * 64);
    }

    /// Opposite edges are neighbours; the jump across the seam should look like
    /// any other step between adjacent cells.
    #[test]
    fn terrain_tiles_across_seam() {
        let map = generate_heightmap(&TerrainConfig {
            water_level: 0.0,
            ..small(4242)
        })
        .expect("generate");
        let size = map.size() as i32;
        let mut max_inner = 0i32;
        let mut max_seam = 0i32;
        for y in 0..size {
            for x in 0..size - 1 {
                let d = map.height_at_cell(x, y) as i32 - map.height_at_cell(x + 1, y) as i32;
                max_inner = max_inner.max(d.abs());
            }
            let d = map.height_at_cell(size - 1, y) as i32 - map.height_at_cell(0, y) as i32;
            max_seam = max_seam.max(d.abs());
        }
        assert!(max_seam <= max_inner.max(1) * 2, "seam {max_seam} vs inner {max_inner}");
    }

    #[test]
    fn flooded_cells_are_flat_and_blue() {
        let config = TerrainConfig {
            water_level: 0.5,
            ..small(31337)
        };
        let map = generate_heightmap(&config).expect("generate");
        let water_height = to_height(0.5);
        let mut flooded = 0;
        for (h, c) in map.heights().iter().zip(map.colors()) {
            if *c == WATER {
                assert_eq!(*h, water_height);
                flooded += 1;
            }
        }
        assert!(flooded > 0, "a 0.5 waterline should flood part of the map");
    }
}
