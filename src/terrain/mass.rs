//! Procedural mountain masses
//!
//! A mountain is a layered group of perturbed convex shapes: a main body, a
//! shoulder, a ridge cap, a low talus skirt and 3-4 flanks around the base.
//! `MassLayout` fixes the dimensions of every mass; the visual mesh and the
//! collider set are both derived from it.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::rng::TerrainRng;

/// Role of a mass within a mountain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassKind {
    Body,
    Shoulder,
    Ridge,
    Talus,
    Flank,
}

/// Placement and size of one mass, local to the feature origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassSpec {
    pub kind: MassKind,
    pub offset: DVec3,
    pub radius: f64,
    pub height: f64,
}

/// Dimensions of a whole mountain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassLayout {
    pub scale: f64,
    pub base_radius: f64,
    pub height: f64,
    /// Body first, then shoulder, ridge, talus, flanks
    pub masses: Vec<MassSpec>,
}

impl MassLayout {
    /// Draw a layout for `scale` from `rng`
    pub fn generate(scale: f64, rng: &mut TerrainRng) -> Self {
        let base_radius = scale * rng.range(0.78, 0.92);
        let height = scale * rng.range(0.95, 1.25);

        let mut masses = Vec::with_capacity(8);
        masses.push(MassSpec {
            kind: MassKind::Body,
            offset: DVec3::ZERO,
            radius: base_radius,
            height,
        });

        let a = rng.angle();
        let d = base_radius * rng.range(0.22, 0.34);
        masses.push(MassSpec {
            kind: MassKind::Shoulder,
            offset: DVec3::new(a.cos() * d, 0.0, a.sin() * d),
            radius: base_radius * rng.range(0.55, 0.68),
            height: height * rng.range(0.58, 0.7),
        });

        let a = rng.angle();
        let d = base_radius * rng.range(0.06, 0.14);
        masses.push(MassSpec {
            kind: MassKind::Ridge,
            offset: DVec3::new(a.cos() * d, height * rng.range(0.52, 0.6), a.sin() * d),
            radius: base_radius * rng.range(0.3, 0.38),
            height: height * rng.range(0.38, 0.46),
        });

        masses.push(MassSpec {
            kind: MassKind::Talus,
            offset: DVec3::new(0.0, -height * 0.02, 0.0),
            radius: base_radius * rng.range(1.2, 1.35),
            height: height * rng.range(0.14, 0.2),
        });

        let flank_count = if rng.next_f64() < 0.5 { 3 } else { 4 };
        let start = rng.angle();
        for i in 0..flank_count {
            let a = start + i as f64 * TAU / flank_count as f64 + rng.jitter(0.35);
            let d = base_radius * rng.range(0.62, 0.8);
            masses.push(MassSpec {
                kind: MassKind::Flank,
                offset: DVec3::new(a.cos() * d, 0.0, a.sin() * d),
                radius: base_radius * rng.range(0.3, 0.42),
                height: height * rng.range(0.26, 0.4),
            });
        }

        Self {
            scale,
            base_radius,
            height,
            masses,
        }
    }

    pub fn flanks(&self) -> impl Iterator<Item = &MassSpec> {
        self.masses.iter().filter(|m| m.kind == MassKind::Flank)
    }

    /// Upper bound on the planar radius of any mass at its foot
    ///
    /// Holds for every visual noise draw, so colliders can be sized from the
    /// layout alone.
    pub fn base_reach(&self) -> f64 {
        self.masses
            .iter()
            .map(|m| {
                let spread = match m.kind {
                    MassKind::Talus => SKIRT_RADIAL_MAX,
                    _ => PROFILE_FOOT_MAX * RADIAL_MAX,
                };
                m.offset.x.hypot(m.offset.z) + m.radius * spread
            })
            .fold(0.0, f64::max)
    }
}

/// GPU-ready vertex for generated meshes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle mesh local to its mass offset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MassMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Horizontal extent of the mesh from its local origin
    pub fn max_radius(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| (v.position[0] as f64).hypot(v.position[2] as f64))
            .fold(0.0, f64::max)
    }
}

/// One renderable mass of a mountain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassPart {
    pub kind: MassKind,
    pub offset: DVec3,
    pub mesh: MassMesh,
}

/// Noise parameters for one mass, drawn from the visual stream
#[derive(Debug, Clone, Copy)]
struct Erosion {
    ridge_phase: [f64; 3],
    twist: f64,
    grain_phase: f64,
    buttress_count: f64,
    buttress_phase: f64,
    buttress_amp: f64,
    shoulder_bulge: f64,
    foot_lift: f64,
    peak_lift: f64,
}

/// Radial noise multiplier bounds for dome masses
pub const RADIAL_MIN: f64 = 0.6;
pub const RADIAL_MAX: f64 = 1.3;
/// Talus skirt noise is kept tighter so its rim stays near the layout radius
pub const SKIRT_RADIAL_MAX: f64 = 1.1;
/// Largest value of the dome profile (reached at the foot)
pub const PROFILE_FOOT_MAX: f64 = 1.101;

const RIDGE_FREQ: [f64; 3] = [3.0, 5.0, 9.0];
const RIDGE_AMP: [f64; 3] = [0.12, 0.07, 0.035];

impl Erosion {
    fn draw(rng: &mut TerrainRng) -> Self {
        Self {
            ridge_phase: [rng.angle(), rng.angle(), rng.angle()],
            twist: rng.jitter(1.2),
            grain_phase: rng.angle(),
            buttress_count: (4 + rng.index(4)) as f64,
            buttress_phase: rng.angle(),
            buttress_amp: rng.range(0.08, 0.18),
            shoulder_bulge: rng.range(0.06, 0.16),
            foot_lift: rng.range(0.02, 0.06),
            peak_lift: rng.range(0.03, 0.08),
        }
    }

    /// Radial multiplier at angle `theta` and normalized height `h`
    fn radial(&self, theta: f64, h: f64) -> f64 {
        let mut ridge = 0.0;
        for k in 0..3 {
            ridge += RIDGE_AMP[k] * (RIDGE_FREQ[k] * theta + self.ridge_phase[k] + h * self.twist).sin();
        }
        let grain = 0.025 * (23.0 * theta + 11.0 * h + self.grain_phase).sin();
        let buttress = self.buttress_amp
            * (1.0 - h)
            * (self.buttress_count * theta + self.buttress_phase).sin().max(0.0).powi(3);
        (1.0 + ridge + grain + buttress).clamp(RADIAL_MIN, RADIAL_MAX)
    }

    /// Dome profile: wide base narrowing to the peak with a shoulder bulge
    fn profile(&self, h: f64) -> f64 {
        let foot = 1.0 + 0.1 * (1.0 - h).powi(4);
        let bulge = self.shoulder_bulge * (-((h - 0.42) / 0.16).powi(2)).exp();
        (1.0 - h).max(0.0).powf(0.85) * foot + bulge * (1.0 - h)
    }

    /// Vertical offset added at normalized height `h`
    fn lift(&self, theta: f64, h: f64, height: f64) -> f64 {
        let foot = self.foot_lift * (1.0 - h).powi(6) * (2.0 * theta + self.grain_phase).sin();
        let peak = self.peak_lift * h.powi(8);
        (foot + peak) * height
    }
}

const DOME_RINGS: usize = 10;
const DOME_SEGMENTS: usize = 20;
const SKIRT_RINGS: usize = 3;
const SKIRT_SEGMENTS: usize = 24;

/// Build the visual masses of a layout, drawing noise from `rng`
pub fn build_masses(layout: &MassLayout, rng: &mut TerrainRng) -> Vec<MassPart> {
    layout
        .masses
        .iter()
        .map(|spec| {
            let erosion = Erosion::draw(rng);
            let mesh = match spec.kind {
                MassKind::Talus => skirt_mesh(spec, &erosion),
                _ => dome_mesh(spec, &erosion),
            };
            MassPart {
                kind: spec.kind,
                offset: spec.offset,
                mesh,
            }
        })
        .collect()
}

/// Deformed sphere: rings from base (h = 0) to an apex vertex (h = 1)
fn dome_mesh(spec: &MassSpec, erosion: &Erosion) -> MassMesh {
    let mut positions = Vec::with_capacity(DOME_RINGS * DOME_SEGMENTS + 1);
    for ring in 0..DOME_RINGS {
        let h = ring as f64 / DOME_RINGS as f64;
        // Sphere-like latitude spacing, denser near the peak
        let h = (h * PI * 0.5).sin();
        for seg in 0..DOME_SEGMENTS {
            let theta = seg as f64 / DOME_SEGMENTS as f64 * TAU;
            let r = spec.radius * erosion.profile(h) * erosion.radial(theta, h);
            let y = h * spec.height + erosion.lift(theta, h, spec.height);
            positions.push(DVec3::new(theta.cos() * r, y, theta.sin() * r));
        }
    }
    let apex = positions.len() as u32;
    positions.push(DVec3::new(0.0, spec.height * (1.0 + erosion.peak_lift), 0.0));

    let mut indices = Vec::with_capacity(DOME_RINGS * DOME_SEGMENTS * 6);
    grid_indices(&mut indices, DOME_RINGS, DOME_SEGMENTS);
    let top = ((DOME_RINGS - 1) * DOME_SEGMENTS) as u32;
    for seg in 0..DOME_SEGMENTS as u32 {
        let next = (seg + 1) % DOME_SEGMENTS as u32;
        indices.extend_from_slice(&[top + seg, apex, top + next]);
    }

    finish_mesh(positions, indices)
}

/// Open cylinder for the talus skirt, tapering inward as it rises
fn skirt_mesh(spec: &MassSpec, erosion: &Erosion) -> MassMesh {
    let mut positions = Vec::with_capacity((SKIRT_RINGS + 1) * SKIRT_SEGMENTS);
    for ring in 0..=SKIRT_RINGS {
        let h = ring as f64 / SKIRT_RINGS as f64;
        for seg in 0..SKIRT_SEGMENTS {
            let theta = seg as f64 / SKIRT_SEGMENTS as f64 * TAU;
            let noise = erosion.radial(theta, h * 0.5).min(SKIRT_RADIAL_MAX);
            let r = spec.radius * (1.0 - 0.35 * h) * noise;
            let y = h * spec.height + erosion.lift(theta, h * 0.5, spec.height);
            positions.push(DVec3::new(theta.cos() * r, y, theta.sin() * r));
        }
    }

    let mut indices = Vec::with_capacity(SKIRT_RINGS * SKIRT_SEGMENTS * 6);
    grid_indices(&mut indices, SKIRT_RINGS + 1, SKIRT_SEGMENTS);
    finish_mesh(positions, indices)
}

/// Quads between consecutive rings of `segments` vertices, wound outward
fn grid_indices(indices: &mut Vec<u32>, rings: usize, segments: usize) {
    for ring in 0..rings.saturating_sub(1) {
        let a = (ring * segments) as u32;
        let b = ((ring + 1) * segments) as u32;
        for seg in 0..segments as u32 {
            let next = (seg + 1) % segments as u32;
            indices.extend_from_slice(&[a + seg, b + seg, a + next]);
            indices.extend_from_slice(&[a + next, b + seg, b + next]);
        }
    }
}

/// Area-weighted vertex normals and f32 packing
fn finish_mesh(positions: Vec<DVec3>, indices: Vec<u32>) -> MassMesh {
    let mut normals = vec![DVec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }

    let vertices = positions
        .iter()
        .zip(&normals)
        .map(|(p, n)| MeshVertex {
            position: p.as_vec3().to_array(),
            normal: n.try_normalize().unwrap_or(DVec3::Y).as_vec3().to_array(),
        })
        .collect();

    MassMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_structure() {
        let mut rng = TerrainRng::new(77);
        let layout = MassLayout::generate(60.0, &mut rng);
        assert_eq!(layout.masses[0].kind, MassKind::Body);
        assert_eq!(layout.masses[1].kind, MassKind::Shoulder);
        assert_eq!(layout.masses[2].kind, MassKind::Ridge);
        assert_eq!(layout.masses[3].kind, MassKind::Talus);
        let flanks = layout.flanks().count();
        assert!(flanks == 3 || flanks == 4);
        assert!(layout.base_radius > 60.0 * 0.77 && layout.base_radius < 60.0 * 0.93);
    }

    #[test]
    fn test_layout_deterministic() {
        let a = MassLayout::generate(50.0, &mut TerrainRng::new(9));
        let b = MassLayout::generate(50.0, &mut TerrainRng::new(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_meshes_are_well_formed() {
        let mut rng = TerrainRng::new(3);
        let layout = MassLayout::generate(70.0, &mut rng);
        let parts = build_masses(&layout, &mut rng);
        assert_eq!(parts.len(), layout.masses.len());
        for part in &parts {
            assert_eq!(part.mesh.indices.len() % 3, 0);
            let n = part.mesh.vertices.len() as u32;
            assert!(part.mesh.indices.iter().all(|&i| i < n));
            assert!(part.mesh.vertices.iter().all(|v| v.position.iter().all(|c| c.is_finite())));
        }
    }

    #[test]
    fn test_body_wider_at_base_than_top() {
        let mut rng = TerrainRng::new(11);
        let layout = MassLayout::generate(60.0, &mut rng);
        let parts = build_masses(&layout, &mut rng);
        let body = &parts[0].mesh;
        let ring_radius = |ring: usize| -> f64 {
            body.vertices[ring * DOME_SEGMENTS..(ring + 1) * DOME_SEGMENTS]
                .iter()
                .map(|v| (v.position[0] as f64).hypot(v.position[2] as f64))
                .sum::<f64>()
                / DOME_SEGMENTS as f64
        };
        assert!(ring_radius(0) > ring_radius(DOME_RINGS - 1) * 2.0);
    }

    #[test]
    fn test_talus_is_widest() {
        let layout = MassLayout::generate(60.0, &mut TerrainRng::new(21));
        let talus = layout.masses.iter().find(|m| m.kind == MassKind::Talus);
        assert!(talus.is_some_and(|t| t.radius > layout.base_radius && t.height < layout.height * 0.25));
    }

    #[test]
    fn test_base_reach_bounds_meshes() {
        for seed in 0..8 {
            let layout = MassLayout::generate(72.0, &mut TerrainRng::new(seed));
            let parts = build_masses(&layout, &mut TerrainRng::new(seed ^ 0x55));
            let reach = layout.base_reach();
            for part in &parts {
                let offset = part.offset.x.hypot(part.offset.z);
                assert!(offset + part.mesh.max_radius() <= reach + 1e-3);
            }
        }
    }

    #[test]
    fn test_vertex_bytes_len() {
        let mut rng = TerrainRng::new(5);
        let layout = MassLayout::generate(40.0, &mut rng);
        let parts = build_masses(&layout, &mut rng);
        let mesh = &parts[0].mesh;
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertices.len() * 24);
        assert_eq!(mesh.index_bytes().len(), mesh.indices.len() * 4);
    }
}
