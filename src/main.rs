//! Velotrack entry point
//!
//! Loads the bundled demo levels (or a JSON file given on the command line),
//! prepares them, scatters mountains and logs a per-belt summary.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use std::sync::Arc;

use velotrack::terrain::ScatterReport;
use velotrack::{HeightField, LevelRegistry, Obstacle, TrackError};

const DEMO_LEVELS: &str = include_str!("../levels/demo.json");

/// Rolling hills, flat enough near the origin for the track
fn demo_height(x: f64, z: f64) -> f64 {
    let r = x.hypot(z);
    let hills = (x * 0.011).sin() * 6.0 + (z * 0.009).cos() * 5.0;
    let rise = ((r - 220.0).max(0.0) * 0.04).min(14.0);
    hills + rise
}

fn demo_registry(json: &str) -> Result<LevelRegistry, TrackError> {
    let mut registry = LevelRegistry::new();
    registry.load_json(json, |_| Arc::new(demo_height) as Arc<dyn HeightField>)?;
    registry.prepare_all()?;
    Ok(registry)
}

fn log_report(id: &str, report: &ScatterReport, obstacles: usize) {
    log::info!(
        "{}: {} mountain(s), {} collider(s), seed {:#x}",
        id,
        report.placed(),
        obstacles,
        report.seed
    );
    for belt in &report.belts {
        log::info!(
            "  {:<12} {}/{} placed, {} skipped",
            belt.name,
            belt.placed,
            belt.requested,
            belt.skipped
        );
    }
}

/// Populate every level, returning (id, report, obstacle count) per level
fn populate_all(
    registry: &LevelRegistry,
) -> Result<Vec<(String, ScatterReport, Vec<Obstacle>)>, TrackError> {
    let mut results = Vec::with_capacity(registry.len());
    for id in registry.ids() {
        let mut obstacles = Vec::new();
        let output = registry.populate(id, &mut obstacles)?;
        results.push((id.to_string(), output.report, obstacles));
    }
    Ok(results)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Velotrack starting...");

    match demo_registry(DEMO_LEVELS).and_then(|r| populate_all(&r)) {
        Ok(results) => {
            for (id, report, obstacles) in &results {
                log_report(id, report, obstacles.len());
            }
        }
        Err(e) => log::error!("Demo levels failed: {}", e),
    }
}

/// Scatter reports for the bundled levels, as JSON
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn demo_reports_json() -> Result<String, JsValue> {
    let registry = demo_registry(DEMO_LEVELS).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let results = populate_all(&registry).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let reports: Vec<_> = results.into_iter().map(|(_, report, _)| report).collect();
    serde_json::to_string(&reports).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Velotrack (native) starting...");

    let json = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to read {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => DEMO_LEVELS.to_string(),
    };

    let results = match demo_registry(&json).and_then(|r| populate_all(&r)) {
        Ok(results) => results,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    for (id, report, obstacles) in &results {
        log_report(id, report, obstacles.len());
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}
