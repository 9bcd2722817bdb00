//! Velotrack - track geometry and terrain population for a bike racer
//!
//! Core modules:
//! - `track`: Arc-length curve model, path queries, rider progress
//! - `terrain`: Belt-driven mountain scattering, procedural masses, colliders
//! - `rng`: Seeded LCG shared by placement and mesh synthesis
//! - `registry`: Level loading and the explicit prepare phase
//!
//! Rendering, physics and the per-level height function live outside this
//! crate; they only see the types exported here.

pub mod error;
pub mod registry;
pub mod rng;
pub mod terrain;
pub mod track;

pub use error::TrackError;
pub use registry::LevelRegistry;
pub use rng::TerrainRng;
pub use terrain::{Obstacle, ScatterOutput, scatter_mountains};
pub use track::{Curve, HeightField, Level, LevelDef};

/// Engine configuration constants
pub mod consts {
    /// Height added above the terrain when lifting path points to 3D
    pub const PATH_CLEARANCE: f64 = 0.35;

    /// Default half-width (in segments) of the windowed projection search
    pub const NEAR_WINDOW_RADIUS: usize = 6;

    /// Step used for central-difference terrain normals
    pub const NORMAL_EPS: f64 = 1.5;
    /// Number of samples on the stability ring around a candidate
    pub const STABILITY_RING_SAMPLES: usize = 8;
    /// Ring samples may be this fraction of the center's minimum normal
    pub const STABILITY_RING_TOLERANCE: f64 = 0.88;
    /// Stability ring radius as a fraction of the candidate footprint
    pub const STABILITY_RING_FACTOR: f64 = 0.6;

    /// Largest forward advance a progress tracker accepts in a single update
    pub const MAX_FRAME_ADVANCE: f64 = 60.0;

    /// Fraction of the feature height the base is sunk into the terrain
    pub const BASE_SINK: f64 = 0.06;
}

/// Positive remainder, so wrapped values land in `[0, m)`
#[inline]
pub fn wrap_positive(value: f64, m: f64) -> f64 {
    let r = value % m;
    let r = if r < 0.0 { r + m } else { r };
    // r + m can round up to m for tiny negative remainders
    if r >= m { 0.0 } else { r }
}
