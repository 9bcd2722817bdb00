//! One placed mountain: layout, visual group and colliders
//!
//! A feature is keyed by `(scale, seed)`. Layout, visual noise and collider
//! jitter each read their own salted stream of that seed, so colliders can
//! be rebuilt without regenerating the mesh and the order of the two never
//! matters.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::collider::{ColliderPrimitive, synthesize_colliders};
use super::mass::{MassLayout, MassPart, build_masses};
use crate::rng::{SALT_COLLIDER, SALT_LAYOUT, SALT_VISUAL, TerrainRng};

/// Renderable group for one mountain, positioned in world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGroup {
    pub position: DVec3,
    /// Rotation about +Y (radians)
    pub yaw: f64,
    pub scale: f64,
    pub parts: Vec<MassPart>,
}

impl FeatureGroup {
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.triangle_count()).sum()
    }
}

pub fn feature_layout(scale: f64, seed: u32) -> MassLayout {
    MassLayout::generate(scale, &mut TerrainRng::forked(seed, SALT_LAYOUT))
}

/// Visual masses for a feature, local to its origin
pub fn feature_masses(layout: &MassLayout, seed: u32) -> Vec<MassPart> {
    build_masses(layout, &mut TerrainRng::forked(seed, SALT_VISUAL))
}

/// Local-space colliders for a feature
pub fn feature_colliders(layout: &MassLayout, seed: u32) -> Vec<ColliderPrimitive> {
    synthesize_colliders(layout, &mut TerrainRng::forked(seed, SALT_COLLIDER))
}

/// Rebuild a feature's colliders from `(scale, seed)` alone
pub fn generate_feature_colliders(scale: f64, seed: u32) -> Vec<ColliderPrimitive> {
    feature_colliders(&feature_layout(scale, seed), seed)
}
