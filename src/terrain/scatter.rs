//! Belt-driven mountain scattering
//!
//! For each belt slot, candidates are drawn and filtered until one passes or
//! the attempt budget runs out. Filters run in a fixed order:
//! 1. Inside the inset bounds
//! 2. Far enough from the track (scaled by feature size)
//! 3. Stable terrain underneath
//! 4. No overlap with earlier placements
//!
//! Placement order changes overlap outcomes, so this is strictly sequential.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::collider::{Obstacle, ObstacleKind};
use super::config::{BeltMode, PlacementParams, ResolvedBelt, resolve_belt};
use super::feature::{FeatureGroup, feature_colliders, feature_layout, feature_masses};
use super::stability::{Stability, check_stability};
use crate::consts::{BASE_SINK, STABILITY_RING_FACTOR};
use crate::error::TrackError;
use crate::rng::TerrainRng;
use crate::track::{Bounds, Curve, HeightField, Level};

/// An accepted feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub z: f64,
    /// Terrain height at (x, z) minus the base sink
    pub base_height: f64,
    pub yaw: f64,
    pub scale: f64,
    /// Planar radius used for overlap rejection
    pub footprint: f64,
    /// Index of the belt that placed it
    pub belt: usize,
    /// Seed for the feature's layout, mesh and collider streams
    pub seed: u32,
}

/// Per-belt outcome counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeltReport {
    pub name: String,
    pub requested: u32,
    pub placed: u32,
    /// Slots that ran out of attempts
    pub skipped: u32,
    pub rejected_bounds: u32,
    pub rejected_track: u32,
    pub rejected_stability: u32,
    pub rejected_overlap: u32,
}

/// Summary of one scatter pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterReport {
    pub seed: u32,
    pub belts: Vec<BeltReport>,
}

impl ScatterReport {
    pub fn placed(&self) -> u32 {
        self.belts.iter().map(|b| b.placed).sum()
    }

    pub fn skipped(&self) -> u32 {
        self.belts.iter().map(|b| b.skipped).sum()
    }
}

/// Everything a scatter pass produces besides obstacles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterOutput {
    pub placements: Vec<Placement>,
    pub groups: Vec<FeatureGroup>,
    pub report: ScatterReport,
}

/// Why a candidate was turned down
#[derive(Debug, Clone, Copy, PartialEq)]
enum Rejection {
    Bounds,
    Track,
    Stability(Stability),
    Overlap,
}

/// A drawn candidate before filtering
#[derive(Debug, Clone, Copy)]
struct Candidate {
    pos: DVec2,
    scale: f64,
    footprint: f64,
}

/// Scatter mountains for a prepared level with engine default parameters
///
/// Accepted features' colliders are appended to `obstacles` in world space.
pub fn scatter_mountains(
    level: &Level,
    obstacles: &mut Vec<Obstacle>,
) -> Result<ScatterOutput, TrackError> {
    scatter_mountains_with(level, &PlacementParams::default(), obstacles)
}

/// Scatter mountains with explicit engine-level defaults
pub fn scatter_mountains_with(
    level: &Level,
    engine: &PlacementParams,
    obstacles: &mut Vec<Obstacle>,
) -> Result<ScatterOutput, TrackError> {
    let curve = level.curve()?;
    let Some(field) = level.def().mountain_field.as_ref() else {
        return Ok(ScatterOutput::default());
    };

    let seed = level.def().seed ^ field.seed_offset;
    let rect = level.def().bounds.inset(field.bounds_inset);
    let center = rect.center();
    let mut rng = TerrainRng::new(seed);

    let mut output = ScatterOutput {
        report: ScatterReport {
            seed,
            belts: Vec::with_capacity(field.belts.len()),
        },
        ..Default::default()
    };

    for (belt_index, belt) in field.belts.iter().enumerate() {
        let belt = resolve_belt(engine, field, belt, belt_index);
        let mut report = BeltReport {
            name: belt.name.clone(),
            requested: belt.count,
            ..Default::default()
        };

        for slot in 0..belt.count {
            let mut accepted = None;
            for _ in 0..belt.params.attempts {
                let candidate = draw_candidate(&belt, &rect, center, &mut rng);
                match evaluate(
                    &candidate,
                    &belt.params,
                    &rect,
                    curve,
                    level.height_field(),
                    &output.placements,
                ) {
                    Ok(()) => {
                        accepted = Some(candidate);
                        break;
                    }
                    Err(Rejection::Bounds) => report.rejected_bounds += 1,
                    Err(Rejection::Track) => report.rejected_track += 1,
                    Err(Rejection::Stability(_)) => report.rejected_stability += 1,
                    Err(Rejection::Overlap) => report.rejected_overlap += 1,
                }
            }

            let Some(candidate) = accepted else {
                log::debug!(
                    "Level '{}' belt '{}' slot {}: no valid spot in {} attempts",
                    level.id(),
                    belt.name,
                    slot,
                    belt.params.attempts
                );
                report.skipped += 1;
                continue;
            };

            let yaw = rng.angle();
            let feature_seed = rng.next_seed();
            let feature = output.placements.len() as u32;
            let (placement, group) = build_feature(
                level,
                &candidate,
                yaw,
                feature_seed,
                belt_index,
                feature,
                obstacles,
            );
            output.placements.push(placement);
            output.groups.push(group);
            report.placed += 1;
        }

        log::debug!(
            "Belt '{}': placed {}/{} (rejected: bounds {}, track {}, stability {}, overlap {})",
            report.name,
            report.placed,
            report.requested,
            report.rejected_bounds,
            report.rejected_track,
            report.rejected_stability,
            report.rejected_overlap
        );
        output.report.belts.push(report);
    }

    log::info!(
        "Level '{}' mountains: {} placed, {} skipped (seed {:#x})",
        level.id(),
        output.report.placed(),
        output.report.skipped(),
        seed
    );

    Ok(output)
}

/// Draw a candidate position for the belt's mode, then its scale
fn draw_candidate(belt: &ResolvedBelt, rect: &Bounds, center: DVec2, rng: &mut TerrainRng) -> Candidate {
    let pos = match belt.mode {
        BeltMode::Uniform => DVec2::new(
            rng.range(rect.min_x, rect.max_x),
            rng.range(rect.min_z, rect.max_z),
        ),
        BeltMode::Ring { radius, spread } => {
            let a = rng.angle();
            let r = radius + rng.jitter(spread * 0.5);
            center + DVec2::new(a.cos(), a.sin()) * r
        }
        BeltMode::Line {
            x,
            jitter,
            z_min,
            z_max,
        } => {
            let z_lo = z_min.unwrap_or(rect.min_z);
            let z_hi = z_max.unwrap_or(rect.max_z);
            let z = rng.range(z_lo, z_hi);
            DVec2::new(x + rng.jitter(jitter), z + rng.jitter(jitter))
        }
        BeltMode::Edge { inset, band } => {
            let side = rng.index(4);
            let depth = inset + rng.next_f64() * band;
            let along = rng.next_f64();
            match side {
                0 => DVec2::new(rect.min_x + depth, rect.min_z + along * rect.depth()),
                1 => DVec2::new(rect.max_x - depth, rect.min_z + along * rect.depth()),
                2 => DVec2::new(rect.min_x + along * rect.width(), rect.min_z + depth),
                _ => DVec2::new(rect.min_x + along * rect.width(), rect.max_z - depth),
            }
        }
    };

    let p = &belt.params;
    let scale = rng.biased(p.min_scale, p.max_scale, p.scale_bias);
    Candidate {
        pos,
        scale,
        footprint: p.footprint(scale),
    }
}

/// Run the acceptance filters in order
fn evaluate(
    candidate: &Candidate,
    params: &PlacementParams,
    rect: &Bounds,
    curve: &Curve,
    height: &dyn HeightField,
    placed: &[Placement],
) -> Result<(), Rejection> {
    let DVec2 { x, y: z } = candidate.pos;

    if !rect.contains(x, z) {
        return Err(Rejection::Bounds);
    }

    if curve.distance_to_track(x, z) < params.track_clearance(candidate.scale) {
        return Err(Rejection::Track);
    }

    let ring_radius = candidate.footprint * STABILITY_RING_FACTOR;
    match check_stability(height, x, z, ring_radius, params.min_normal_y, params.max_relief) {
        Stability::Stable => {}
        unstable => return Err(Rejection::Stability(unstable)),
    }

    let overlaps = placed.iter().any(|other| {
        let min_dist = (candidate.footprint + other.footprint) * params.spacing_scale;
        candidate.pos.distance(DVec2::new(other.x, other.z)) < min_dist
    });
    if overlaps {
        return Err(Rejection::Overlap);
    }

    Ok(())
}

/// Generate the accepted feature's geometry and emit its world colliders
fn build_feature(
    level: &Level,
    candidate: &Candidate,
    yaw: f64,
    seed: u32,
    belt: usize,
    feature: u32,
    obstacles: &mut Vec<Obstacle>,
) -> (Placement, FeatureGroup) {
    let DVec2 { x, y: z } = candidate.pos;
    let layout = feature_layout(candidate.scale, seed);
    let parts = feature_masses(&layout, seed);
    let colliders = feature_colliders(&layout, seed);

    let base_height = level.height_at(x, z) - layout.height * BASE_SINK;
    let origin = DVec3::new(x, base_height, z);

    obstacles.extend(colliders.iter().map(|c| Obstacle {
        kind: ObstacleKind::Mountain,
        feature,
        collider: c.placed(origin, yaw),
    }));

    let placement = Placement {
        x,
        z,
        base_height,
        yaw,
        scale: candidate.scale,
        footprint: candidate.footprint,
        belt,
        seed,
    };
    let group = FeatureGroup {
        position: origin,
        yaw,
        scale: candidate.scale,
        parts,
    };
    (placement, group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Belt, MountainField, PlacementOverrides};
    use crate::track::LevelDef;

    fn circle_path(radius: f64, points: usize) -> Vec<[f64; 2]> {
        (0..points)
            .map(|i| {
                let a = i as f64 / points as f64 * std::f64::consts::TAU;
                [a.cos() * radius, a.sin() * radius]
            })
            .collect()
    }

    fn level_with(belts: Vec<Belt>, height: impl HeightField + 'static) -> Level {
        let def = LevelDef {
            id: "scatter".to_string(),
            looped: true,
            path: circle_path(120.0, 16),
            bounds: Bounds::square(400.0),
            seed: 4242,
            mountain_field: Some(MountainField {
                seed_offset: 0x11,
                bounds_inset: 12.0,
                defaults: PlacementOverrides::default(),
                belts,
            }),
        };
        let mut level = Level::new(def, height);
        level.prepare().expect("valid level");
        level
    }

    fn belt(mode: BeltMode, count: u32) -> Belt {
        Belt {
            name: None,
            mode,
            count,
            overrides: PlacementOverrides::default(),
        }
    }

    #[test]
    fn test_unprepared_level_is_error() {
        let def = LevelDef {
            id: "raw".to_string(),
            looped: false,
            path: vec![[0.0, 0.0], [1.0, 0.0]],
            bounds: Bounds::square(10.0),
            seed: 0,
            mountain_field: None,
        };
        let level = Level::new(def, |_x: f64, _z: f64| 0.0);
        let mut obstacles = Vec::new();
        assert!(matches!(
            scatter_mountains(&level, &mut obstacles),
            Err(TrackError::NotPrepared { .. })
        ));
    }

    #[test]
    fn test_no_field_no_output() {
        let mut level = level_with(vec![], |_x: f64, _z: f64| 0.0);
        level.set_mountain_field(None);
        let mut obstacles = Vec::new();
        let out = scatter_mountains(&level, &mut obstacles).expect("prepared");
        assert!(out.placements.is_empty());
        assert!(obstacles.is_empty());
    }

    #[test]
    fn test_every_mode_respects_invariants() {
        let belts = vec![
            belt(BeltMode::Uniform, 6),
            belt(
                BeltMode::Ring {
                    radius: 300.0,
                    spread: 30.0,
                },
                5,
            ),
            belt(
                BeltMode::Line {
                    x: -300.0,
                    jitter: 20.0,
                    z_min: Some(-250.0),
                    z_max: Some(250.0),
                },
                3,
            ),
            belt(
                BeltMode::Edge {
                    inset: 10.0,
                    band: 40.0,
                },
                4,
            ),
        ];
        let level = level_with(belts, |x: f64, z: f64| (x * 0.01).sin() * 4.0 + (z * 0.013).cos() * 3.0);
        let curve = level.curve().expect("prepared");
        let mut obstacles = Vec::new();
        let out = scatter_mountains(&level, &mut obstacles).expect("prepared");
        let params = PlacementParams::default();

        assert!(out.placements.len() <= 18);
        assert_eq!(out.placements.len(), out.groups.len());
        for (i, p) in out.placements.iter().enumerate() {
            assert!(curve.distance_to_track(p.x, p.z) >= params.track_clearance(p.scale) - 1e-9);
            assert!(p.scale >= params.min_scale && p.scale < params.max_scale);
            for q in &out.placements[i + 1..] {
                let d = DVec2::new(p.x - q.x, p.z - q.z).length();
                assert!(d >= (p.footprint + q.footprint) * params.spacing_scale - 1e-9);
            }
        }
        let emitted = obstacles.iter().map(|o| o.feature).max().map(|m| m + 1).unwrap_or(0);
        assert_eq!(emitted as usize, out.placements.len());
    }

    #[test]
    fn test_steep_world_places_nothing() {
        let level = level_with(
            vec![belt(BeltMode::Uniform, 5)],
            |x: f64, z: f64| x * 3.0 + z * 3.0,
        );
        let mut obstacles = Vec::new();
        let out = scatter_mountains(&level, &mut obstacles).expect("prepared");
        assert!(out.placements.is_empty());
        assert_eq!(out.report.skipped(), 5);
        assert!(out.report.belts[0].rejected_stability > 0);
        assert!(obstacles.is_empty());
    }

    #[test]
    fn test_world_colliders_follow_placement() {
        let level = level_with(
            vec![belt(
                BeltMode::Ring {
                    radius: 320.0,
                    spread: 10.0,
                },
                2,
            )],
            |_x: f64, _z: f64| 1.0,
        );
        let mut obstacles = Vec::new();
        let out = scatter_mountains(&level, &mut obstacles).expect("prepared");
        assert!(!out.placements.is_empty());
        for (i, p) in out.placements.iter().enumerate() {
            let near = obstacles
                .iter()
                .filter(|o| o.feature == i as u32)
                .all(|o| {
                    let c = o.collider.offset();
                    DVec2::new(c.x - p.x, c.z - p.z).length() <= p.scale * 1.5
                });
            assert!(near);
        }
    }

    #[test]
    fn test_unreachable_clearance_skips_slots() {
        // Track clearance larger than the whole map
        let mut b = belt(BeltMode::Uniform, 3);
        b.overrides.min_track_dist = Some(5000.0);
        b.overrides.attempts = Some(4);
        let level = level_with(vec![b], |_x: f64, _z: f64| 0.0);
        let mut obstacles = Vec::new();
        let out = scatter_mountains(&level, &mut obstacles).expect("prepared");
        assert!(out.placements.is_empty());
        assert_eq!(out.report.belts[0].rejected_track, 12);
    }
}
