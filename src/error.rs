use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("geometry source not found at {}; download it and place it there first", .path.display())]
    MissingInput { path: PathBuf },

    #[error("config file not found at {}", .path.display())]
    MissingConfig { path: PathBuf },

    #[error("unsupported geometry format for {} (expected .shp, .geojson or .json)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("feature {index} has no usable `{field}`")]
    MissingField { field: String, index: usize },

    #[error("{} region(s) have no claim metric: {}", .names.len(), .names.join(", "))]
    UnmatchedRegions { names: Vec<String> },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
