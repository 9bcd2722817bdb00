//! Procedural mountain scatter around a prepared track

pub mod collider;
pub mod config;
pub mod feature;
pub mod mass;
pub mod scatter;
pub mod stability;

pub use collider::{ColliderPrimitive, Obstacle, ObstacleKind};
pub use config::{Belt, BeltMode, MountainField, PlacementOverrides, PlacementParams};
pub use feature::{FeatureGroup, generate_feature_colliders};
pub use mass::{MassKind, MassMesh, MassPart, MeshVertex};
pub use scatter::{
    BeltReport, Placement, ScatterOutput, ScatterReport, scatter_mountains, scatter_mountains_with,
};
pub use stability::{Stability, check_stability, surface_normal};
