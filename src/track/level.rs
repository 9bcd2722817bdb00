//! Level data and the height field seam
//!
//! A `LevelDef` is the authored, serializable part of a level. A `Level` pairs
//! it with the externally supplied height function and, once prepared, the
//! derived curve.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::curve::Curve;
use crate::error::TrackError;
use crate::terrain::MountainField;

/// Terrain height sampler supplied per level
///
/// Must be a pure, deterministic function of `(x, z)`.
pub trait HeightField: Send + Sync {
    fn height_at(&self, x: f64, z: f64) -> f64;
}

impl<F> HeightField for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    #[inline]
    fn height_at(&self, x: f64, z: f64) -> f64 {
        self(x, z)
    }
}

/// Axis-aligned rectangle in the (x, z) plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Bounds {
    pub fn new(min_x: f64, max_x: f64, min_z: f64, max_z: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Square bounds `[-half, half]` on both axes
    pub fn square(half: f64) -> Self {
        Self::new(-half, half, -half, half)
    }

    /// Shrink every side by `inset`; collapses to the center instead of inverting
    pub fn inset(&self, inset: f64) -> Self {
        let c = self.center();
        Self {
            min_x: (self.min_x + inset).min(c.x),
            max_x: (self.max_x - inset).max(c.x),
            min_z: (self.min_z + inset).min(c.y),
            max_z: (self.max_z - inset).max(c.y),
        }
    }

    /// Center as (x, z)
    pub fn center(&self) -> DVec2 {
        DVec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_z + self.max_z) * 0.5,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn contains(&self, x: f64, z: f64) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// Authored level data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDef {
    pub id: String,
    /// Closed circuit (last point connects back to the first)
    #[serde(rename = "loop")]
    pub looped: bool,
    /// Ordered (x, z) control points
    pub path: Vec<[f64; 2]>,
    pub bounds: Bounds,
    pub seed: u32,
    #[serde(default)]
    pub mountain_field: Option<MountainField>,
}

impl LevelDef {
    /// Parse a level definition from JSON
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a list of level definitions from a JSON array
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, TrackError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A level at runtime: authored data, height field, derived curve
///
/// The authored path is fixed once the level exists, so a prepared curve
/// always matches `def()`.
pub struct Level {
    def: LevelDef,
    height: Arc<dyn HeightField>,
    curve: Option<Curve>,
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("def", &self.def)
            .field("prepared", &self.curve.is_some())
            .finish()
    }
}

impl Level {
    pub fn new(def: LevelDef, height: impl HeightField + 'static) -> Self {
        Self::with_shared_height(def, Arc::new(height))
    }

    pub fn with_shared_height(def: LevelDef, height: Arc<dyn HeightField>) -> Self {
        Self {
            def,
            height,
            curve: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn def(&self) -> &LevelDef {
        &self.def
    }

    /// Replace the mountain field; the curve does not depend on it
    pub fn set_mountain_field(&mut self, field: Option<MountainField>) {
        self.def.mountain_field = field;
    }

    /// Build the derived curve (once); later calls return the existing curve
    pub fn prepare(&mut self) -> Result<&Curve, TrackError> {
        if self.curve.is_none() {
            let curve = Curve::build(
                &self.def.id,
                &self.def.path,
                self.def.looped,
                Arc::clone(&self.height),
            )?;
            log::info!(
                "Prepared level '{}': {} segments, length {:.1}{}",
                self.def.id,
                curve.segment_count(),
                curve.total_length(),
                if curve.is_loop() { " (loop)" } else { "" }
            );
            self.curve = Some(curve);
        }
        self.curve()
    }

    pub fn is_prepared(&self) -> bool {
        self.curve.is_some()
    }

    /// The prepared curve, or `NotPrepared`
    pub fn curve(&self) -> Result<&Curve, TrackError> {
        self.curve.as_ref().ok_or_else(|| TrackError::NotPrepared {
            level: self.def.id.clone(),
        })
    }

    #[inline]
    pub fn height_at(&self, x: f64, z: f64) -> f64 {
        self.height.height_at(x, z)
    }

    pub fn height_field(&self) -> &dyn HeightField {
        self.height.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(path: Vec<[f64; 2]>, looped: bool) -> LevelDef {
        LevelDef {
            id: "test".to_string(),
            looped,
            path,
            bounds: Bounds::square(100.0),
            seed: 1,
            mountain_field: None,
        }
    }

    #[test]
    fn test_bounds_inset() {
        let b = Bounds::square(430.0).inset(12.0);
        assert_eq!(b.min_x, -418.0);
        assert_eq!(b.max_z, 418.0);
        assert!(b.contains(0.0, 0.0));
        assert!(!b.contains(420.0, 0.0));
    }

    #[test]
    fn test_bounds_inset_never_inverts() {
        let b = Bounds::new(0.0, 10.0, 0.0, 10.0).inset(20.0);
        assert!(b.min_x <= b.max_x);
        assert!(b.min_z <= b.max_z);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let mut level = Level::new(def(vec![[0.0, 0.0], [10.0, 0.0]], false), |_x: f64, _z: f64| 0.0);
        assert!(level.curve().is_err());
        let first = level.prepare().map(|c| c.total_length()).ok();
        let second = level.prepare().map(|c| c.total_length()).ok();
        assert_eq!(first, Some(10.0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_mountain_field_swap_keeps_curve() {
        let mut level = Level::new(def(vec![[0.0, 0.0], [0.0, 25.0]], false), |_x: f64, _z: f64| 0.0);
        level.prepare().expect("valid path");
        level.set_mountain_field(Some(MountainField {
            seed_offset: 7,
            bounds_inset: 4.0,
            defaults: Default::default(),
            belts: Vec::new(),
        }));
        assert!(level.is_prepared());
        assert_eq!(level.def().path, vec![[0.0, 0.0], [0.0, 25.0]]);
        assert_eq!(level.curve().map(|c| c.total_length()).ok(), Some(25.0));
        assert_eq!(level.def().mountain_field.as_ref().map(|f| f.seed_offset), Some(7));
    }

    #[test]
    fn test_level_def_from_json() {
        let json = r#"{
            "id": "canyon",
            "loop": true,
            "path": [[0, 0], [100, 0], [100, 100]],
            "bounds": { "min_x": -200, "max_x": 200, "min_z": -200, "max_z": 200 },
            "seed": 42
        }"#;
        let def = LevelDef::from_json(json).expect("valid level json");
        assert!(def.looped);
        assert_eq!(def.path.len(), 3);
        assert!(def.mountain_field.is_none());
    }

    #[test]
    fn test_level_def_bad_json() {
        assert!(matches!(
            LevelDef::from_json("{ \"id\": 3 }"),
            Err(TrackError::Json(_))
        ));
    }
}
