//! Track geometry
//!
//! Turns an authored polyline into an arc-length curve and answers the
//! queries racing code needs:
//! - Sampling position/direction at arc length `s`
//! - Global and windowed nearest-point projection
//! - Signed and forward progress arithmetic for loops and open tracks

pub mod curve;
pub mod level;
pub mod progress;
pub mod query;

pub use curve::Curve;
pub use level::{Bounds, HeightField, Level, LevelDef};
pub use progress::{ProgressTracker, ProgressUpdate, race_order};
pub use query::{CurveSample, Projection};
