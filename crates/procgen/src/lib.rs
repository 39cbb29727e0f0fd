//! Terrain data for the voxel world: the heightmap store and seeded,
//! seamlessly tiling procedural maps.

pub mod heightmap;
pub mod terrain;

pub use heightmap::*;
pub use terrain::*;
