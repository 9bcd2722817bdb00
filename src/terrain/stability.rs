//! Terrain stability test for large features
//!
//! Rejects candidates on steep or jagged ground so a mountain never appears
//! perched on a cliff edge.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::consts::{NORMAL_EPS, STABILITY_RING_SAMPLES, STABILITY_RING_TOLERANCE};
use crate::track::HeightField;

/// Outcome of a stability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    Stable,
    /// Center normal too far from vertical
    SteepCenter,
    /// A ring sample's normal too far from vertical
    SteepRing,
    /// Height range across the ring exceeds the relief limit
    Jagged,
}

/// Unit surface normal from a central-difference height gradient
pub fn surface_normal(height: &dyn HeightField, x: f64, z: f64) -> DVec3 {
    let e = NORMAL_EPS;
    let dhdx = (height.height_at(x + e, z) - height.height_at(x - e, z)) / (2.0 * e);
    let dhdz = (height.height_at(x, z + e) - height.height_at(x, z - e)) / (2.0 * e);
    DVec3::new(-dhdx, 1.0, -dhdz).try_normalize().unwrap_or(DVec3::Y)
}

/// Check the ground under a candidate at (x, z)
pub fn check_stability(
    height: &dyn HeightField,
    x: f64,
    z: f64,
    ring_radius: f64,
    min_normal_y: f64,
    max_relief: f64,
) -> Stability {
    if surface_normal(height, x, z).y < min_normal_y {
        return Stability::SteepCenter;
    }

    let ring_min = min_normal_y * STABILITY_RING_TOLERANCE;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for k in 0..STABILITY_RING_SAMPLES {
        let a = k as f64 / STABILITY_RING_SAMPLES as f64 * TAU;
        let sx = x + a.cos() * ring_radius;
        let sz = z + a.sin() * ring_radius;
        if surface_normal(height, sx, sz).y < ring_min {
            return Stability::SteepRing;
        }
        let h = height.height_at(sx, sz);
        lo = lo.min(h);
        hi = hi.max(h);
    }

    if hi - lo > max_relief {
        Stability::Jagged
    } else {
        Stability::Stable
    }
}
