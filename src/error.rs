//! Error types for level preparation and loading
//!
//! Only configuration problems are errors. A belt slot that finds no valid
//! candidate is not an error, and neither is a stale projection seed.

/// Errors raised while loading or preparing a level
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("level '{level}': path needs at least 2 points, got {count}")]
    TooFewPoints { level: String, count: usize },

    #[error("level '{level}': path point {index} has a non-finite coordinate")]
    NonFinitePoint { level: String, index: usize },

    #[error("level '{level}': path total length {total} is zero or non-finite")]
    DegenerateLength { level: String, total: f64 },

    #[error("level '{level}' has not been prepared")]
    NotPrepared { level: String },

    #[error("duplicate level id '{id}'")]
    DuplicateLevel { id: String },

    #[error("unknown level id '{id}'")]
    UnknownLevel { id: String },

    #[error("level JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
