//! Software voxel-space terrain renderer for Voxel Strike.
//!
//! Renders straight from the heightmap with a per-column ray march; no GPU, no
//! depth buffer. Also hosts the terrain queries gameplay shares with the
//! renderer (water, slope, landing) and world-to-screen projection.

pub mod camera;
pub mod frame;
pub mod projection;
pub mod queries;
pub mod renderer;

pub use camera::*;
pub use frame::*;
pub use projection::*;
pub use queries::*;
pub use renderer::*;
