use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MapError, Result};

/// What to do with regions that have no generated metric after the join.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Inner join: unmatched regions are dropped (with a warning).
    Drop,
    /// Abort the run naming every unmatched region.
    Fail,
    /// Left join: keep the region with `claim_count = 0` and this risk score.
    Default { risk_score: f64 },
}

/// Tooltip labels shown next to each field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TooltipAliases {
    pub region: String,
    pub claims: String,
    pub risk: String,
}

impl Default for TooltipAliases {
    fn default() -> Self {
        TooltipAliases {
            region: "Region:".to_string(),
            claims: "Claims:".to_string(),
            risk: "Risk:".to_string(),
        }
    }
}

/// Base map tiles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TileLayer {
    pub url: String,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        TileLayer {
            url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Seed for the single claims stream. Same seed + same region order
    /// reproduces every metric.
    pub seed: u64,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Attribute holding each region's name.
    pub name_field: String,
    /// Optional NDJSON dump of the generated claims table.
    pub metrics_out: Option<PathBuf>,
    pub on_unmatched: UnmatchedPolicy,
    pub title: String,
    pub legend_caption: String,
    /// `[lat, lon]`.
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: TileLayer,
    pub tooltip: TooltipAliases,
}

impl MapConfig {
    pub fn canonical() -> Self {
        MapConfig {
            seed: 42,
            input: PathBuf::from("UK_regions.shp"),
            output: PathBuf::from("uk_motor_insurance_claims_risk_map.html"),
            name_field: "region_name".to_string(),
            metrics_out: None,
            on_unmatched: UnmatchedPolicy::Drop,
            title: "UK motor insurance claims risk".to_string(),
            legend_caption: "Risk score".to_string(),
            // ── Centred on Great Britain ──────────────────────────────────────
            center: [54.0, -2.0],
            zoom: 6,
            tiles: TileLayer::default(),
            tooltip: TooltipAliases::default(),
        }
    }

    /// Load a (possibly partial) config from JSON; missing keys fall back to
    /// `canonical()`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MapError::MissingConfig { path: path.to_path_buf() });
        }
        let reader = BufReader::new(File::open(path)?);
        let config: MapConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let [lat, lon] = self.center;
        if !((-90.0..=90.0).contains(&lat) && lat.is_finite()) {
            return Err(MapError::InvalidConfig(format!("centre latitude {lat} out of range")));
        }
        if !((-180.0..=180.0).contains(&lon) && lon.is_finite()) {
            return Err(MapError::InvalidConfig(format!("centre longitude {lon} out of range")));
        }
        if self.zoom > 20 {
            return Err(MapError::InvalidConfig(format!("zoom {} exceeds 20", self.zoom)));
        }
        if self.name_field.trim().is_empty() {
            return Err(MapError::InvalidConfig("name field must not be empty".to_string()));
        }
        if let UnmatchedPolicy::Default { risk_score } = self.on_unmatched
            && !(0.0..=1.0).contains(&risk_score)
        {
            return Err(MapError::InvalidConfig(format!(
                "default risk score {risk_score} outside [0, 1]"
            )));
        }
        Ok(())
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::canonical()
    }
}
