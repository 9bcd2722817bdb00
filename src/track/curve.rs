//! Arc-length parameterized track curve
//!
//! Built once from a level's authored polyline. Segment lengths are planar
//! (x, z) distances; heights only matter for the lifted 3D points.

use glam::{DVec2, DVec3};
use std::fmt;
use std::sync::Arc;

use super::level::HeightField;
use crate::consts::PATH_CLEARANCE;
use crate::error::TrackError;

/// Derived curve data for one level (immutable after `build`)
#[derive(Clone)]
pub struct Curve {
    looped: bool,
    /// Authored points lifted to terrain height plus clearance
    path_points: Vec<DVec3>,
    /// Planar length of each segment
    segment_lengths: Vec<f64>,
    /// Prefix sums of `segment_lengths`, starting at 0
    cumulative: Vec<f64>,
    total_length: f64,
    height: Arc<dyn HeightField>,
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve")
            .field("looped", &self.looped)
            .field("points", &self.path_points.len())
            .field("total_length", &self.total_length)
            .finish()
    }
}

impl Curve {
    /// Lift the authored path and compute cumulative arc length
    ///
    /// Rejects paths with fewer than two points, non-finite coordinates or a
    /// zero/non-finite total length.
    pub fn build(
        level_id: &str,
        path: &[[f64; 2]],
        looped: bool,
        height: Arc<dyn HeightField>,
    ) -> Result<Self, TrackError> {
        if path.len() < 2 {
            return Err(TrackError::TooFewPoints {
                level: level_id.to_string(),
                count: path.len(),
            });
        }
        if let Some(index) = path
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(TrackError::NonFinitePoint {
                level: level_id.to_string(),
                index,
            });
        }

        let path_points: Vec<DVec3> = path
            .iter()
            .map(|&[x, z]| DVec3::new(x, height.height_at(x, z) + PATH_CLEARANCE, z))
            .collect();

        let n = path_points.len();
        let segment_count = if looped { n } else { n - 1 };

        let mut segment_lengths = Vec::with_capacity(segment_count);
        let mut cumulative = Vec::with_capacity(segment_count + 1);
        cumulative.push(0.0);
        let mut total = 0.0;
        for i in 0..segment_count {
            let a = path_points[i];
            let b = path_points[(i + 1) % n];
            let len = DVec2::new(b.x - a.x, b.z - a.z).length();
            segment_lengths.push(len);
            total += len;
            cumulative.push(total);
        }

        if !(total.is_finite() && total > 0.0) {
            return Err(TrackError::DegenerateLength {
                level: level_id.to_string(),
                total,
            });
        }

        Ok(Self {
            looped,
            path_points,
            segment_lengths,
            cumulative,
            total_length: total,
            height,
        })
    }

    #[inline]
    pub fn is_loop(&self) -> bool {
        self.looped
    }

    #[inline]
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segment_lengths.len()
    }

    pub fn path_points(&self) -> &[DVec3] {
        &self.path_points
    }

    pub fn segment_lengths(&self) -> &[f64] {
        &self.segment_lengths
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Start and end points of segment `i` (end wraps to point 0 on loops)
    #[inline]
    pub(crate) fn segment(&self, i: usize) -> (DVec3, DVec3) {
        let n = self.path_points.len();
        (self.path_points[i], self.path_points[(i + 1) % n])
    }

    /// Terrain height plus path clearance at (x, z)
    #[inline]
    pub(crate) fn surface_y(&self, x: f64, z: f64) -> f64 {
        self.height.height_at(x, z) + PATH_CLEARANCE
    }
}
