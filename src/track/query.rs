//! Path queries: sampling, projection and progress arithmetic
//!
//! Every query allocates nothing and keeps no shared scratch state, so calls
//! can be freely interleaved.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::curve::Curve;
use crate::consts::NEAR_WINDOW_RADIUS;
use crate::wrap_positive;

/// A point sampled on the curve at arc length `s`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    /// Normalized arc length
    pub s: f64,
    pub point: DVec3,
    /// Unit direction of the containing segment
    pub forward: DVec3,
    pub segment_index: usize,
    /// Fraction along the containing segment
    pub t: f64,
}

/// Nearest-point projection result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub s: f64,
    /// Squared planar distance to the nearest point
    pub dist_sq: f64,
}

impl Projection {
    const NONE: Self = Self {
        s: 0.0,
        dist_sq: f64::INFINITY,
    };

    #[inline]
    pub fn distance(&self) -> f64 {
        self.dist_sq.sqrt()
    }
}

impl Curve {
    /// Wrap `s` into `[0, T)` on loops, clamp into `[0, T]` otherwise
    pub fn normalize_s(&self, s: f64) -> f64 {
        let total = self.total_length();
        if self.is_loop() {
            wrap_positive(s, total)
        } else {
            s.clamp(0.0, total)
        }
    }

    /// Index of the first segment whose end arc length reaches `s`
    fn segment_index_at(&self, s: f64) -> usize {
        let cumulative = self.cumulative();
        (0..self.segment_count())
            .find(|&i| cumulative[i + 1] >= s)
            .unwrap_or(self.segment_count().saturating_sub(1))
    }

    /// Sample position and direction at arc length `s`
    pub fn sample(&self, s: f64) -> CurveSample {
        let s = self.normalize_s(s);
        let i = self.segment_index_at(s);
        let (a, b) = self.segment(i);
        let len = self.segment_lengths()[i];

        let t = if len > 0.0 {
            ((s - self.cumulative()[i]) / len).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let x = a.x + (b.x - a.x) * t;
        let z = a.z + (b.z - a.z) * t;
        let forward = (b - a).try_normalize().unwrap_or(DVec3::Z);

        CurveSample {
            s,
            point: DVec3::new(x, self.surface_y(x, z), z),
            forward,
            segment_index: i,
            t,
        }
    }

    /// Closest point on segment `i` to (x, z) as (dist_sq, s)
    #[inline]
    fn project_on_segment(&self, i: usize, p: DVec2) -> Projection {
        let (a, b) = self.segment(i);
        let a = DVec2::new(a.x, a.z);
        let d = DVec2::new(b.x, b.z) - a;
        let len_sq = d.length_squared();
        let u = if len_sq > 0.0 {
            ((p - a).dot(d) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = a + d * u;
        Projection {
            s: self.cumulative()[i] + self.segment_lengths()[i] * u,
            dist_sq: (p - closest).length_squared(),
        }
    }

    #[inline]
    fn finish_projection(&self, best: Projection) -> Projection {
        Projection {
            s: self.normalize_s(best.s),
            dist_sq: best.dist_sq,
        }
    }

    /// Global nearest-point projection over every segment
    pub fn project_progress(&self, x: f64, z: f64) -> Projection {
        let p = DVec2::new(x, z);
        let mut best = Projection::NONE;
        for i in 0..self.segment_count() {
            let candidate = self.project_on_segment(i, p);
            if candidate.dist_sq < best.dist_sq {
                best = candidate;
            }
        }
        self.finish_projection(best)
    }

    /// Projection restricted to segments within `radius` of the one holding `seed_s`
    ///
    /// Meant for per-frame tracking of a rider whose previous `s` is known.
    /// A stale seed can give a local minimum; a non-finite seed or a window
    /// covering the whole curve falls back to `project_progress`.
    pub fn project_progress_near(&self, x: f64, z: f64, seed_s: f64, radius: usize) -> Projection {
        let n = self.segment_count();
        if !seed_s.is_finite() || n == 0 || radius.saturating_mul(2).saturating_add(1) >= n {
            return self.project_progress(x, z);
        }

        let p = DVec2::new(x, z);
        let center = self.segment_index_at(self.normalize_s(seed_s));
        let mut best = Projection::NONE;

        if self.is_loop() {
            let r = radius as isize;
            for k in -r..=r {
                let i = (center as isize + k).rem_euclid(n as isize) as usize;
                let candidate = self.project_on_segment(i, p);
                if candidate.dist_sq < best.dist_sq {
                    best = candidate;
                }
            }
        } else {
            let lo = center.saturating_sub(radius);
            let hi = (center + radius).min(n - 1);
            for i in lo..=hi {
                let candidate = self.project_on_segment(i, p);
                if candidate.dist_sq < best.dist_sq {
                    best = candidate;
                }
            }
        }

        self.finish_projection(best)
    }

    /// `project_progress_near` with the default window
    pub fn project_progress_near_default(&self, x: f64, z: f64, seed_s: f64) -> Projection {
        self.project_progress_near(x, z, seed_s, NEAR_WINDOW_RADIUS)
    }

    /// Planar distance from (x, z) to the nearest point of the track
    pub fn distance_to_track(&self, x: f64, z: f64) -> f64 {
        self.project_progress(x, z).distance()
    }

    /// Shortest signed displacement from `from_s` to `to_s`
    ///
    /// Loops wrap into `(-T/2, T/2]`; open tracks return the raw difference.
    pub fn signed_progress_delta(&self, from_s: f64, to_s: f64) -> f64 {
        let delta = to_s - from_s;
        if !self.is_loop() {
            return delta;
        }
        let total = self.total_length();
        let wrapped = wrap_positive(delta, total);
        if wrapped > total * 0.5 {
            wrapped - total
        } else {
            wrapped
        }
    }

    /// Distance travelled strictly forward from `from_s` to `to_s`
    ///
    /// Loops normalize into `[0, T)`; open tracks return the raw difference.
    pub fn forward_progress_distance(&self, from_s: f64, to_s: f64) -> f64 {
        let delta = to_s - from_s;
        if self.is_loop() {
            wrap_positive(delta, self.total_length())
        } else {
            delta
        }
    }
}
