//! Heightmap store: paired height and color rasters addressed by wrapped cell.
//!
//! Maps ship as `color{N}.png` (RGB) and `height{N}.png` (8-bit luminance), one
//! pair per map index. Both rasters must be exactly `map_size × map_size`. Once
//! loaded a heightmap is immutable; callers share it behind an `Arc`.

use std::path::{Path, PathBuf};

use engine_core::WorldConfig;
use thiserror::Error;

/// Highest map index that ships with the game.
pub const MAX_MAP_INDEX: u32 = 29;

/// Errors raised while building or loading a heightmap.
#[derive(Debug, Error)]
pub enum HeightmapError {
    #[error("map index {0} out of range (1..={MAX_MAP_INDEX})")]
    MapIndexOutOfRange(u32),
    #[error("failed to read raster {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("raster {path} is {width}x{height}, expected {expected}x{expected}")]
    DimensionMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },
    #[error("raster holds {got} cells, expected {expected}")]
    RasterLength { got: usize, expected: usize },
}

/// Height and color samples for one map.
#[derive(Debug, Clone)]
pub struct Heightmap {
    size: u32,
    shift: u32,
    heights: Vec<u8>,
    colors: Vec<[u8; 3]>,
}

impl Heightmap {
    /// Build from in-memory rasters (row-major, `y * size + x`).
    pub fn from_rasters(
        shift: u32,
        heights: Vec<u8>,
        colors: Vec<[u8; 3]>,
    ) -> Result<Self, HeightmapError> {
        let size = 1u32 << shift;
        let expected = (size as usize) * (size as usize);
        if heights.len() != expected {
            return Err(HeightmapError::RasterLength {
                got: heights.len(),
                expected,
            });
        }
        if colors.len() != expected {
            return Err(HeightmapError::RasterLength {
                got: colors.len(),
                expected,
            });
        }
        Ok(Self {
            size,
            shift,
            heights,
            colors,
        })
    }

    /// Load the raster pair for `map_index` from `dir`.
    pub fn load(dir: &Path, map_index: u32, config: &WorldConfig) -> Result<Self, HeightmapError> {
        if !(1..=MAX_MAP_INDEX).contains(&map_index) {
            return Err(HeightmapError::MapIndexOutOfRange(map_index));
        }
        let (color_path, height_path) = raster_paths(dir, map_index);

        let color = open_raster(&color_path)?.to_rgb8();
        check_dimensions(&color_path, color.width(), color.height(), config.map_size)?;
        let height = open_raster(&height_path)?.to_luma8();
        check_dimensions(&height_path, height.width(), height.height(), config.map_size)?;

        let colors = color.pixels().map(|p| p.0).collect();
        let heights = height.into_raw();
        let map = Self::from_rasters(config.map_shift, heights, colors)?;
        log::info!(
            "Loaded map {} ({}x{}) from {}",
            map_index,
            map.size,
            map.size,
            dir.display()
        );
        Ok(map)
    }

    /// Edge length in cells.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    #[inline]
    pub fn mask(&self) -> u32 {
        self.size - 1
    }

    /// Raster index of any integer cell, wrapped onto the map.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> usize {
        let mask = self.mask() as i32;
        (((y & mask) << self.shift) + (x & mask)) as usize
    }

    #[inline]
    pub fn height_at_cell(&self, x: i32, y: i32) -> u8 {
        self.heights[self.index(x, y)]
    }

    #[inline]
    pub fn color_at_cell(&self, x: i32, y: i32) -> [u8; 3] {
        self.colors[self.index(x, y)]
    }

    /// Height of the cell containing world point `(x, y)`.
    #[inline]
    pub fn height_at(&self, x: f32, y: f32) -> f32 {
        self.height_at_cell(x.floor() as i32, y.floor() as i32) as f32
    }

    /// Color of the cell containing world point `(x, y)`.
    #[inline]
    pub fn color_at(&self, x: f32, y: f32) -> [u8; 3] {
        self.color_at_cell(x.floor() as i32, y.floor() as i32)
    }

    /// Bilinear height across the four cells around `(x, y)`, wrapping at the seams.
    pub fn sample_height(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (ix, iy) = (x0 as i32, y0 as i32);

        let h00 = self.height_at_cell(ix, iy) as f32;
        let h10 = self.height_at_cell(ix + 1, iy) as f32;
        let h01 = self.height_at_cell(ix, iy + 1) as f32;
        let h11 = self.height_at_cell(ix + 1, iy + 1) as f32;

        let top = h00 + (h10 - h00) * fx;
        let bottom = h01 + (h11 - h01) * fx;
        top + (bottom - top) * fy
    }

    /// Raw height raster, row-major.
    pub fn heights(&self) -> &[u8] {
        &self.heights
    }

    /// Raw color raster, row-major.
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }
}

/// `(color, height)` raster paths for a map index.
pub fn raster_paths(dir: &Path, map_index: u32) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("color{map_index}.png")),
        dir.join(format!("height{map_index}.png")),
    )
}

fn open_raster(path: &Path) -> Result<image::DynamicImage, HeightmapError> {
    image::open(path).map_err(|source| HeightmapError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn check_dimensions(path: &Path, width: u32, height: u32, expected: u32) -> Result<(), HeightmapError> {
    if width != expected || height != expected {
        return Err(HeightmapError::DimensionMismatch {
            path: path.to_path_buf(),
            width,
            height,
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(shift: u32) -> Heightmap {
        let size = 1usize << shift;
        let heights = (0..size * size).map(|i| (i % size) as u8).collect();
        let colors = (0..size * size).map(|i| [(i / size) as u8, 0, 0]).collect();
        Heightmap::from_rasters(shift, heights, colors).expect("valid rasters")
    }

    #[test]
    fn cells_wrap_in_both_directions() {
        let map = ramp(4);
        assert_eq!(map.size(), 16);
        assert_eq!(map.height_at_cell(3, 0), 3);
        assert_eq!(map.height_at_cell(19, 0), 3);
        assert_eq!(map.height_at_cell(-1, 0), 15);
        assert_eq!(map.color_at_cell(0, -2), [14, 0, 0]);
        assert_eq!(map.height_at(-0.5, 100.0), 15.0);
    }

    #[test]
    fn bilinear_sample_interpolates() {
        let map = ramp(4);
        assert!((map.sample_height(2.5, 7.0) - 2.5).abs() < 1e-5);
        // Across the seam the ramp jumps from 15 back to 0.
        assert!((map.sample_height(15.5, 0.0) - 7.5).abs() < 1e-5);
    }

    #[test]
    fn mismatched_rasters_are_rejected() {
        let err = Heightmap::from_rasters(4, vec![0; 256], vec![[0; 3]; 255]).unwrap_err();
        assert!(matches!(err, HeightmapError::RasterLength { got: 255, expected: 256 }));
    }

    #[test]
    fn map_index_is_bounds_checked() {
        let config = WorldConfig::default();
        let err = Heightmap::load(Path::new("."), 0, &config).unwrap_err();
        assert!(matches!(err, HeightmapError::MapIndexOutOfRange(0)));
        let err = Heightmap::load(Path::new("."), 30, &config).unwrap_err();
        assert!(matches!(err, HeightmapError::MapIndexOutOfRange(30)));
    }

    #[test]
    fn missing_assets_surface_an_error() {
        let config = WorldConfig::default();
        let err = Heightmap::load(Path::new("/nonexistent-maps"), 3, &config).unwrap_err();
        assert!(matches!(err, HeightmapError::Image { .. }));
    }
}
