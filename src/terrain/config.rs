//! Mountain field and belt configuration
//!
//! Placement parameters resolve in three layers: engine defaults, then the
//! field's `defaults`, then the belt's own overrides. `resolve_belt` is the
//! only place that precedence is applied.

use serde::{Deserialize, Serialize};

/// How a belt draws candidate positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BeltMode {
    /// Uniform over the inset rectangle
    Uniform,
    /// Annulus around the rectangle center
    Ring { radius: f64, spread: f64 },
    /// Along z at a fixed x, jittered on both axes
    Line {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        jitter: f64,
        #[serde(default)]
        z_min: Option<f64>,
        #[serde(default)]
        z_max: Option<f64>,
    },
    /// A band of `band` width, `inset` in from a randomly chosen side
    Edge { inset: f64, band: f64 },
}

/// Fully resolved placement parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementParams {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Exponent of the scale draw (>1 favors small features)
    pub scale_bias: f64,
    /// Footprint radius = scale * footprint_scale
    pub footprint_scale: f64,
    /// Fixed clearance from the track centerline
    pub min_track_dist: f64,
    /// Extra clearance per unit of scale, keeps the racing view open
    pub view_clearance: f64,
    /// Extra clearance per unit of scale, keeps sightlines open
    pub sightline_clearance: f64,
    /// Minimum vertical normal component at the candidate center
    pub min_normal_y: f64,
    /// Maximum height range across the stability ring
    pub max_relief: f64,
    /// Multiplier on summed footprints for the overlap test
    pub spacing_scale: f64,
    /// Candidate draws per slot
    pub attempts: u32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            min_scale: 38.0,
            max_scale: 84.0,
            scale_bias: 1.35,
            footprint_scale: 0.62,
            min_track_dist: 60.0,
            view_clearance: 0.16,
            sightline_clearance: 0.1,
            min_normal_y: 0.74,
            max_relief: 22.0,
            spacing_scale: 1.0,
            attempts: 48,
        }
    }
}

impl PlacementParams {
    /// Minimum distance to the track for a feature of `scale`
    pub fn track_clearance(&self, scale: f64) -> f64 {
        self.min_track_dist
            + scale * self.footprint_scale
            + scale * self.view_clearance
            + scale * self.sightline_clearance
    }

    #[inline]
    pub fn footprint(&self, scale: f64) -> f64 {
        scale * self.footprint_scale
    }
}

/// Optional per-field or per-belt parameter overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementOverrides {
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
    pub scale_bias: Option<f64>,
    pub footprint_scale: Option<f64>,
    pub min_track_dist: Option<f64>,
    pub view_clearance: Option<f64>,
    pub sightline_clearance: Option<f64>,
    pub min_normal_y: Option<f64>,
    pub max_relief: Option<f64>,
    pub spacing_scale: Option<f64>,
    pub attempts: Option<u32>,
}

impl PlacementOverrides {
    /// Apply these overrides on top of `base`
    pub fn layer_over(&self, base: &PlacementParams) -> PlacementParams {
        PlacementParams {
            min_scale: self.min_scale.unwrap_or(base.min_scale),
            max_scale: self.max_scale.unwrap_or(base.max_scale),
            scale_bias: self.scale_bias.unwrap_or(base.scale_bias),
            footprint_scale: self.footprint_scale.unwrap_or(base.footprint_scale),
            min_track_dist: self.min_track_dist.unwrap_or(base.min_track_dist),
            view_clearance: self.view_clearance.unwrap_or(base.view_clearance),
            sightline_clearance: self.sightline_clearance.unwrap_or(base.sightline_clearance),
            min_normal_y: self.min_normal_y.unwrap_or(base.min_normal_y),
            max_relief: self.max_relief.unwrap_or(base.max_relief),
            spacing_scale: self.spacing_scale.unwrap_or(base.spacing_scale),
            attempts: self.attempts.unwrap_or(base.attempts),
        }
    }
}

/// A named group of placements sharing a sampling mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belt {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub mode: BeltMode,
    pub count: u32,
    #[serde(flatten)]
    pub overrides: PlacementOverrides,
}

fn default_bounds_inset() -> f64 {
    12.0
}

/// Per-level mountain scattering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountainField {
    /// XORed with the level seed
    #[serde(default)]
    pub seed_offset: u32,
    #[serde(default = "default_bounds_inset")]
    pub bounds_inset: f64,
    /// Field-wide defaults, overridden per belt
    #[serde(default)]
    pub defaults: PlacementOverrides,
    pub belts: Vec<Belt>,
}

/// A belt with every parameter resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBelt {
    pub name: String,
    pub mode: BeltMode,
    pub count: u32,
    pub params: PlacementParams,
}

/// Resolve a belt's parameters: engine <- field defaults <- belt overrides
pub fn resolve_belt(
    engine: &PlacementParams,
    field: &MountainField,
    belt: &Belt,
    index: usize,
) -> ResolvedBelt {
    let field_params = field.defaults.layer_over(engine);
    let params = belt.overrides.layer_over(&field_params);
    let name = belt
        .name
        .clone()
        .unwrap_or_else(|| format!("belt{}", index));

    let mut resolved = ResolvedBelt {
        name,
        mode: belt.mode.clone(),
        count: belt.count,
        params,
    };
    resolved.sanitize();
    resolved
}

impl ResolvedBelt {
    /// Repair values that would make sampling meaningless
    fn sanitize(&mut self) {
        let p = &mut self.params;
        if p.min_scale > p.max_scale {
            log::warn!(
                "Belt '{}': min_scale {} > max_scale {}, swapping",
                self.name,
                p.min_scale,
                p.max_scale
            );
            std::mem::swap(&mut p.min_scale, &mut p.max_scale);
        }
        if p.attempts == 0 {
            log::warn!("Belt '{}': attempts = 0, using 1", self.name);
            p.attempts = 1;
        }
        if p.scale_bias.is_nan() || p.scale_bias <= 0.0 {
            log::warn!("Belt '{}': scale_bias {} invalid, using 1", self.name, p.scale_bias);
            p.scale_bias = 1.0;
        }
        p.spacing_scale = p.spacing_scale.max(0.0);
        p.footprint_scale = p.footprint_scale.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(defaults: PlacementOverrides, belt: Belt) -> MountainField {
        MountainField {
            seed_offset: 0,
            bounds_inset: 12.0,
            defaults,
            belts: vec![belt],
        }
    }

    fn ring_belt(overrides: PlacementOverrides) -> Belt {
        Belt {
            name: None,
            mode: BeltMode::Ring {
                radius: 300.0,
                spread: 20.0,
            },
            count: 4,
            overrides,
        }
    }

    #[test]
    fn test_engine_defaults_when_unset() {
        let engine = PlacementParams::default();
        let f = field(PlacementOverrides::default(), ring_belt(PlacementOverrides::default()));
        let r = resolve_belt(&engine, &f, &f.belts[0], 0);
        assert_eq!(r.params, engine);
        assert_eq!(r.name, "belt0");
    }

    #[test]
    fn test_belt_beats_field_beats_engine() {
        let engine = PlacementParams::default();
        let field_defaults = PlacementOverrides {
            min_track_dist: Some(70.0),
            max_relief: Some(30.0),
            ..Default::default()
        };
        let belt_overrides = PlacementOverrides {
            min_track_dist: Some(88.0),
            ..Default::default()
        };
        let f = field(field_defaults, ring_belt(belt_overrides));
        let r = resolve_belt(&engine, &f, &f.belts[0], 0);
        assert_eq!(r.params.min_track_dist, 88.0);
        assert_eq!(r.params.max_relief, 30.0);
        assert_eq!(r.params.attempts, engine.attempts);
    }

    #[test]
    fn test_inverted_scale_range_swapped() {
        let engine = PlacementParams::default();
        let overrides = PlacementOverrides {
            min_scale: Some(90.0),
            max_scale: Some(50.0),
            attempts: Some(0),
            ..Default::default()
        };
        let f = field(PlacementOverrides::default(), ring_belt(overrides));
        let r = resolve_belt(&engine, &f, &f.belts[0], 0);
        assert_eq!((r.params.min_scale, r.params.max_scale), (50.0, 90.0));
        assert_eq!(r.params.attempts, 1);
    }

    #[test]
    fn test_track_clearance_sum() {
        let p = PlacementParams {
            min_track_dist: 88.0,
            footprint_scale: 0.5,
            view_clearance: 0.2,
            sightline_clearance: 0.1,
            ..Default::default()
        };
        assert!((p.track_clearance(50.0) - (88.0 + 25.0 + 10.0 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_belt_json_flattened() {
        let json = r#"{
            "seed_offset": 34721,
            "defaults": { "max_relief": 18.0 },
            "belts": [
                { "name": "outer", "mode": "ring", "radius": 356, "spread": 18, "count": 6, "min_track_dist": 88 },
                { "mode": "edge", "inset": 10, "band": 40, "count": 3 },
                { "mode": "line", "x": -200, "jitter": 15, "count": 2 },
                { "mode": "uniform", "count": 5, "attempts": 12 }
            ]
        }"#;
        let field: MountainField = serde_json::from_str(json).expect("valid field json");
        assert_eq!(field.bounds_inset, 12.0);
        assert_eq!(field.defaults.max_relief, Some(18.0));
        assert_eq!(field.belts.len(), 4);
        assert_eq!(
            field.belts[0].mode,
            BeltMode::Ring {
                radius: 356.0,
                spread: 18.0
            }
        );
        assert_eq!(field.belts[0].overrides.min_track_dist, Some(88.0));
        assert!(matches!(field.belts[2].mode, BeltMode::Line { z_min: None, .. }));
        assert_eq!(field.belts[3].overrides.attempts, Some(12));
    }
}
