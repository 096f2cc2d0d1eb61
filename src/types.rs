
use geojson::Geometry;
use serde::{Deserialize, Serialize};

/// A named area from the geometry source.
/// The geometry is owned by the loader and passed through to the rendered
/// overlay untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub geometry: Geometry,
}

/// Synthetic claims record for one region. Built once per run, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMetric {
    pub region_name: String,
    /// Integer in `[50, 1000)`. Zero only for left-joined placeholder rows.
    pub claim_count: u32,
    /// Float in `[0.0, 1.0)`.
    pub risk_score: f64,
}

/// 8-bit sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREEN: Rgb = Rgb(0x00, 0x80, 0x00);
    pub const YELLOW: Rgb = Rgb(0xff, 0xff, 0x00);
    pub const RED: Rgb = Rgb(0xff, 0x00, 0x00);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

    /// CSS hex form, e.g. `#ff0000`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
