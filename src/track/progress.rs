//! Per-rider race progress
//!
//! Follows a rider along the curve frame by frame using the windowed
//! projection, and keeps lap count and total progress for standings.

use serde::{Deserialize, Serialize};

use super::curve::Curve;
use crate::consts::{MAX_FRAME_ADVANCE, NEAR_WINDOW_RADIUS};

/// Result of one tracker update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Arc length after the update
    pub s: f64,
    /// Forward distance gained this update (0 when moving backward)
    pub gained: f64,
    /// Crossed the start line forward on a loop
    pub lap_completed: bool,
}

/// Tracks one rider's position along a curve
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressTracker {
    s: Option<f64>,
    laps: i32,
    /// Sum of forward gains (never decreases)
    distance: f64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current arc length, if the tracker has seen a position yet
    pub fn s(&self) -> Option<f64> {
        self.s
    }

    /// Completed laps (can dip below zero if a rider reverses over the line)
    pub fn laps(&self) -> i32 {
        self.laps
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Laps times track length plus current arc length
    pub fn total_progress(&self, curve: &Curve) -> f64 {
        let s = self.s.unwrap_or(0.0);
        if curve.is_loop() {
            self.laps as f64 * curve.total_length() + s
        } else {
            s
        }
    }

    /// Forget the current position (respawn, level restart)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the rider's current (x, z)
    pub fn update(&mut self, curve: &Curve, x: f64, z: f64) -> ProgressUpdate {
        let Some(prev) = self.s else {
            let s = curve.project_progress(x, z).s;
            self.s = Some(s);
            return ProgressUpdate {
                s,
                gained: 0.0,
                lap_completed: false,
            };
        };

        let mut proj = curve.project_progress_near(x, z, prev, NEAR_WINDOW_RADIUS);
        let mut delta = curve.signed_progress_delta(prev, proj.s);
        if delta.abs() > MAX_FRAME_ADVANCE {
            // Seed too stale for the window; redo globally and treat as a jump
            proj = curve.project_progress(x, z);
            delta = curve.signed_progress_delta(prev, proj.s);
            if delta.abs() > MAX_FRAME_ADVANCE {
                log::debug!("Progress jump {:.1} -> {:.1}, not counted", prev, proj.s);
                self.s = Some(proj.s);
                return ProgressUpdate {
                    s: proj.s,
                    gained: 0.0,
                    lap_completed: false,
                };
            }
        }

        let mut lap_completed = false;
        if curve.is_loop() {
            if delta > 0.0 && proj.s < prev {
                self.laps += 1;
                lap_completed = true;
            } else if delta < 0.0 && proj.s > prev {
                self.laps -= 1;
            }
        }

        let gained = if delta > 0.0 {
            curve.forward_progress_distance(prev, proj.s)
        } else {
            0.0
        };
        self.distance += gained;
        self.s = Some(proj.s);

        ProgressUpdate {
            s: proj.s,
            gained,
            lap_completed,
        }
    }
}

/// Indices of riders ordered from leader to last by total progress
pub fn race_order(curve: &Curve, riders: &[ProgressTracker]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..riders.len()).collect();
    order.sort_by(|&a, &b| {
        riders[b]
            .total_progress(curve)
            .partial_cmp(&riders[a].total_progress(curve))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ring(looped: bool) -> Curve {
        let path: Vec<[f64; 2]> = (0..24)
            .map(|i| {
                let a = i as f64 / 24.0 * std::f64::consts::TAU;
                [a.cos() * 150.0, a.sin() * 150.0]
            })
            .collect();
        Curve::build("ring", &path, looped, Arc::new(|_x: f64, _z: f64| 0.0)).expect("valid")
    }

    #[test]
    fn test_laps_counted_on_loop() {
        let curve = ring(true);
        let mut tracker = ProgressTracker::new();
        let t = curve.total_length();
        let mut laps_seen = 0;

        // Two and a bit laps in small steps
        let steps = 200;
        for i in 0..=steps {
            let s = (i as f64 / steps as f64) * 2.1 * t;
            let p = curve.sample(s).point;
            if tracker.update(&curve, p.x, p.z).lap_completed {
                laps_seen += 1;
            }
        }

        assert_eq!(laps_seen, 2);
        assert_eq!(tracker.laps(), 2);
        assert!((tracker.distance() - 2.1 * t).abs() < 1.0);
    }

    #[test]
    fn test_backward_motion_gains_nothing() {
        let curve = ring(false);
        let mut tracker = ProgressTracker::new();
        let p = curve.sample(300.0).point;
        tracker.update(&curve, p.x, p.z);
        let back = curve.sample(280.0).point;
        let update = tracker.update(&curve, back.x, back.z);
        assert_eq!(update.gained, 0.0);
        assert_eq!(tracker.distance(), 0.0);
    }

    #[test]
    fn test_teleport_is_not_progress() {
        let curve = ring(true);
        let mut tracker = ProgressTracker::new();
        let a = curve.sample(10.0).point;
        tracker.update(&curve, a.x, a.z);
        let far = curve.sample(curve.total_length() * 0.4).point;
        let update = tracker.update(&curve, far.x, far.z);
        assert_eq!(update.gained, 0.0);
        assert!((update.s - curve.total_length() * 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_race_order() {
        let curve = ring(true);
        let mut riders = vec![ProgressTracker::new(), ProgressTracker::new()];
        let behind = curve.sample(20.0).point;
        let ahead = curve.sample(50.0).point;
        riders[0].update(&curve, behind.x, behind.z);
        riders[1].update(&curve, ahead.x, ahead.z);
        assert_eq!(race_order(&curve, &riders), vec![1, 0]);
    }
}
