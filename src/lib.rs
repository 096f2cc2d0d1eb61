//! Choropleth map of regional motor-insurance risk.
//!
//! Regions are loaded from a GeoJSON or Shapefile source, paired with
//! synthetic claim metrics drawn from a seeded stream, coloured on a
//! green → yellow → red scale and written out as a self-contained Leaflet
//! page.

pub mod colormap;
pub mod config;
pub mod error;
pub mod join;
pub mod metrics;
pub mod pipeline;
pub mod regions;
pub mod render;
pub mod types;

pub use config::{MapConfig, UnmatchedPolicy};
pub use error::{MapError, Result};
