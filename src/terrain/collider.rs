//! Simplified collision volumes for procedural mountains
//!
//! The visual mesh is far too detailed for the physics layer, so every
//! mountain gets a fixed recipe of spheres and boxes scaled from its base
//! radius and height. The recipe follows the mesh's silhouette closely
//! enough that riders never float on, or pass through, the base, core or
//! flanks.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, TAU};

use super::mass::{MassLayout, PROFILE_FOOT_MAX};
use crate::rng::TerrainRng;

/// Crash severity weights consumed by the physics layer
pub mod weights {
    pub const CORE: f64 = 1.84;
    pub const BOX: f64 = 1.82;
    pub const LAYER: f64 = 1.78;
    pub const CAP: f64 = 1.76;
    pub const FLANK: f64 = 1.72;
    pub const RING: f64 = 1.7;
    pub const BASE: f64 = 1.68;
    pub const TALUS: f64 = 1.66;
}

const TALUS_SPHERES: usize = 8;

/// A collision primitive; `offset` is feature-local until placed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColliderPrimitive {
    /// Sphere squashed or stretched to `height` vertical half-extent
    Sphere {
        offset: DVec3,
        radius: f64,
        height: f64,
        crash_weight: f64,
    },
    /// Box rotated by `local_yaw` about the vertical axis
    Box {
        offset: DVec3,
        half_width: f64,
        half_length: f64,
        half_height: f64,
        local_yaw: f64,
        crash_weight: f64,
    },
}

impl ColliderPrimitive {
    fn sphere(offset: DVec3, radius: f64, height: f64, crash_weight: f64) -> Self {
        Self::Sphere {
            offset,
            radius,
            height,
            crash_weight,
        }
    }

    pub fn offset(&self) -> DVec3 {
        match *self {
            Self::Sphere { offset, .. } | Self::Box { offset, .. } => offset,
        }
    }

    pub fn crash_weight(&self) -> f64 {
        match *self {
            Self::Sphere { crash_weight, .. } | Self::Box { crash_weight, .. } => crash_weight,
        }
    }

    /// Top of the primitive, relative to the same origin as `offset`
    pub fn top(&self) -> f64 {
        match *self {
            Self::Sphere { offset, height, .. } => offset.y + height,
            Self::Box {
                offset, half_height, ..
            } => offset.y + half_height,
        }
    }

    /// Horizontal reach from the origin
    pub fn reach(&self) -> f64 {
        match *self {
            Self::Sphere { offset, radius, .. } => offset.x.hypot(offset.z) + radius,
            Self::Box {
                offset,
                half_width,
                half_length,
                ..
            } => offset.x.hypot(offset.z) + half_width.hypot(half_length),
        }
    }

    /// Whether `point` (same frame as `offset`) lies inside the primitive
    pub fn contains(&self, point: DVec3) -> bool {
        match *self {
            Self::Sphere {
                offset,
                radius,
                height,
                ..
            } => {
                let d = point - offset;
                (d.x * d.x + d.z * d.z) / (radius * radius) + (d.y * d.y) / (height * height) <= 1.0
            }
            Self::Box {
                offset,
                half_width,
                half_length,
                half_height,
                local_yaw,
                ..
            } => {
                let d = DQuat::from_rotation_y(-local_yaw) * (point - offset);
                d.x.abs() <= half_width && d.z.abs() <= half_length && d.y.abs() <= half_height
            }
        }
    }

    /// Move into world space: rotate the offset by `yaw`, then translate
    pub fn placed(&self, origin: DVec3, yaw: f64) -> Self {
        let rotation = DQuat::from_rotation_y(yaw);
        match *self {
            Self::Sphere {
                offset,
                radius,
                height,
                crash_weight,
            } => Self::Sphere {
                offset: origin + rotation * offset,
                radius,
                height,
                crash_weight,
            },
            Self::Box {
                offset,
                half_width,
                half_length,
                half_height,
                local_yaw,
                crash_weight,
            } => Self::Box {
                offset: origin + rotation * offset,
                half_width,
                half_length,
                half_height,
                local_yaw: local_yaw + yaw,
                crash_weight,
            },
        }
    }
}

/// What an obstacle is, for the physics layer's response tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Mountain,
}

/// A world-space collider handed to physics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    /// Index of the feature within its scatter pass
    pub feature: u32,
    pub collider: ColliderPrimitive,
}

/// Ring of `count` spheres at height `y`, evenly spaced from a random phase
#[allow(clippy::too_many_arguments)]
fn sphere_ring(
    out: &mut Vec<ColliderPrimitive>,
    rng: &mut TerrainRng,
    count: usize,
    y: f64,
    dist: f64,
    radius: f64,
    height: f64,
    crash_weight: f64,
) {
    let phase = rng.angle();
    for k in 0..count {
        let a = phase + k as f64 * TAU / count as f64 + rng.jitter(0.08);
        out.push(ColliderPrimitive::sphere(
            DVec3::new(a.cos() * dist, y, a.sin() * dist),
            radius,
            height,
            crash_weight,
        ));
    }
}

/// Collider recipe for a mountain layout, with small jitter drawn from `rng`
pub fn synthesize_colliders(layout: &MassLayout, rng: &mut TerrainRng) -> Vec<ColliderPrimitive> {
    let r = layout.base_radius;
    let h = layout.height;
    let mut out = Vec::with_capacity(48);

    // Talus skirt: flattened base plus a ring of low spheres, both sized to
    // the widest possible foot so the rim never pokes out between them
    let foot = layout.base_reach();
    out.push(ColliderPrimitive::sphere(
        DVec3::new(0.0, h * 0.02, 0.0),
        foot * 0.8,
        h * 0.16,
        weights::BASE,
    ));
    let phase = rng.angle();
    for k in 0..TALUS_SPHERES {
        let a = phase + k as f64 * TAU / TALUS_SPHERES as f64;
        out.push(ColliderPrimitive::sphere(
            DVec3::new(a.cos() * foot * 0.78, h * 0.02, a.sin() * foot * 0.78),
            foot * 0.42,
            h * 0.16,
            weights::TALUS,
        ));
    }

    // Core layers, narrowing with height
    for i in 0..5 {
        let t = i as f64;
        let weight = if i < 3 { weights::CORE } else { weights::LAYER };
        out.push(ColliderPrimitive::sphere(
            DVec3::new(0.0, h * (0.1 + 0.15 * t), 0.0),
            r * (0.86 - 0.14 * t),
            h * 0.12,
            weight,
        ));
    }

    // Boxes filling the core between layer spheres
    out.push(ColliderPrimitive::Box {
        offset: DVec3::new(0.0, h * 0.26, 0.0),
        half_width: r * 0.5,
        half_length: r * 0.34,
        half_height: h * 0.24,
        local_yaw: 0.0,
        crash_weight: weights::BOX,
    });
    out.push(ColliderPrimitive::Box {
        offset: DVec3::new(0.0, h * 0.26, 0.0),
        half_width: r * 0.34,
        half_length: r * 0.5,
        half_height: h * 0.24,
        local_yaw: rng.jitter(0.15),
        crash_weight: weights::BOX,
    });
    out.push(ColliderPrimitive::Box {
        offset: DVec3::new(0.0, h * 0.5, 0.0),
        half_width: r * 0.28,
        half_length: r * 0.28,
        half_height: h * 0.16,
        local_yaw: FRAC_PI_4 + rng.jitter(0.2),
        crash_weight: weights::BOX,
    });

    // Profile rings: low, mid, upper
    sphere_ring(&mut out, rng, 8, h * 0.16, r * 0.72, r * 0.22, h * 0.12, weights::RING);
    sphere_ring(&mut out, rng, 7, h * 0.38, r * 0.52, r * 0.19, h * 0.11, weights::RING);
    sphere_ring(&mut out, rng, 5, h * 0.6, r * 0.32, r * 0.15, h * 0.09, weights::RING);

    for flank in layout.flanks() {
        out.push(ColliderPrimitive::sphere(
            DVec3::new(flank.offset.x, flank.height * 0.4, flank.offset.z),
            flank.radius * PROFILE_FOOT_MAX,
            flank.height * 0.55,
            weights::FLANK,
        ));
    }

    out.push(ColliderPrimitive::sphere(
        DVec3::new(0.0, h * 0.9, 0.0),
        r * 0.12,
        h * 0.1,
        weights::CAP,
    ));

    out
}
