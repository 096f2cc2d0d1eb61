//! Overlay styling and the self-contained HTML map artifact.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geojson::Geometry;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::colormap::{LinearColormap, color_for};
use crate::config::{MapConfig, TileLayer, TooltipAliases};
use crate::error::Result;
use crate::types::{ClaimMetric, Region, Rgb};

pub const STROKE_COLOR: Rgb = Rgb::BLACK;
pub const STROKE_WEIGHT: u32 = 1;
pub const FILL_OPACITY: f64 = 0.7;
const LEGEND_TICKS: usize = 5;

/// Leaflet path options for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayStyle {
    pub fill_color: Rgb,
    pub color: Rgb,
    pub weight: u32,
    pub fill_opacity: f64,
}

pub fn style_for(risk_score: f64) -> OverlayStyle {
    OverlayStyle {
        fill_color: color_for(risk_score),
        color: STROKE_COLOR,
        weight: STROKE_WEIGHT,
        fill_opacity: FILL_OPACITY,
    }
}

/// One styled region with its tooltip, ready for the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub region_name: String,
    pub claim_count: u32,
    pub risk_score: f64,
    pub geometry: Geometry,
    pub style: OverlayStyle,
    pub tooltip_html: String,
}

impl Overlay {
    pub fn new(region: Region, metric: &ClaimMetric, aliases: &TooltipAliases) -> Self {
        let tooltip_html = tooltip_table(&[
            (&aliases.region, escape_html(&region.name)),
            (&aliases.claims, metric.claim_count.to_string()),
            (&aliases.risk, localize(metric.risk_score)),
        ]);
        Overlay {
            region_name: region.name,
            claim_count: metric.claim_count,
            risk_score: metric.risk_score,
            geometry: region.geometry,
            style: style_for(metric.risk_score),
            tooltip_html,
        }
    }

    fn to_feature(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "geometry": self.geometry,
            "properties": {
                "region": self.region_name,
                "claim_count": self.claim_count,
                "risk_score": self.risk_score,
                "style": self.style,
                "tooltip": self.tooltip_html,
            }
        })
    }
}

/// Colour-bar legend keyed to the overlay scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub caption: String,
    pub colormap: LinearColormap,
    pub ticks: Vec<f64>,
}

impl Legend {
    pub fn new(caption: impl Into<String>, colormap: LinearColormap) -> Self {
        let ticks = colormap.ticks(LEGEND_TICKS);
        Legend { caption: caption.into(), colormap, ticks }
    }

    fn to_html(&self) -> String {
        let labels: String = self
            .ticks
            .iter()
            .map(|t| format!("<span>{}</span>", localize(*t)))
            .collect();
        format!(
            concat!(
                r#"<div class="legend-caption">{caption}</div>"#,
                r#"<div class="legend-bar" style="background: {gradient};"></div>"#,
                r#"<div class="legend-ticks">{labels}</div>"#,
            ),
            caption = escape_html(&self.caption),
            gradient = self.colormap.css_gradient(),
            labels = labels,
        )
    }
}

/// Everything needed to write the interactive map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapArtifact {
    pub title: String,
    /// `[lat, lon]`.
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: TileLayer,
    pub overlays: Vec<Overlay>,
    pub legend: Legend,
}

/// Build one overlay per joined pair, in join order, plus a single legend.
///
/// Overlays are built in parallel; `collect` keeps input order so each
/// region's colour and tooltip are independent of scheduling.
pub fn render(joined: Vec<(Region, ClaimMetric)>, config: &MapConfig) -> MapArtifact {
    let overlays: Vec<Overlay> = joined
        .into_par_iter()
        .map(|(region, metric)| Overlay::new(region, &metric, &config.tooltip))
        .collect();
    info!("Rendered {} overlays", overlays.len());

    MapArtifact {
        title: config.title.clone(),
        center: config.center,
        zoom: config.zoom,
        tiles: config.tiles.clone(),
        overlays,
        legend: Legend::new(config.legend_caption.clone(), LinearColormap::risk()),
    }
}

impl MapArtifact {
    /// GeoJSON FeatureCollection of every overlay, properties included.
    pub fn overlays_geojson(&self) -> serde_json::Value {
        let features: Vec<serde_json::Value> = self.overlays.iter().map(Overlay::to_feature).collect();
        serde_json::json!({ "type": "FeatureCollection", "features": features })
    }

    pub fn to_html(&self) -> Result<String> {
        let overlays = script_safe(serde_json::to_string(&self.overlays_geojson())?);
        let center = serde_json::to_string(&self.center)?;
        let tile_url = script_safe(serde_json::to_string(&self.tiles.url)?);
        let tile_attr = script_safe(serde_json::to_string(&self.tiles.attribution)?);
        let legend = script_safe(serde_json::to_string(&self.legend.to_html())?);

        Ok(fill_template(
            MAP_TEMPLATE,
            &[
                ("TITLE", escape_html(&self.title)),
                ("CENTER", center),
                ("ZOOM", self.zoom.to_string()),
                ("TILE_URL", tile_url),
                ("TILE_ATTRIBUTION", tile_attr),
                ("LEGEND", legend),
                ("OVERLAYS", overlays),
            ],
        ))
    }
}

/// Write `artifact` to `path`, replacing any existing file.
pub fn save(artifact: &MapArtifact, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let html = artifact.to_html()?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(html.as_bytes())?;
    writer.flush()?;
    info!("Wrote {} bytes to {:?}", html.len(), path);
    Ok(())
}

// ── Formatting helpers ────────────────────────────────────────────────────────

fn tooltip_table(rows: &[(&String, String)]) -> String {
    let body: String = rows
        .iter()
        .map(|(alias, value)| format!("<tr><th>{}</th><td>{}</td></tr>", escape_html(alias), value))
        .collect();
    format!("<table>{body}</table>")
}

/// Up to three decimals, trailing zeros trimmed (`0.5`, `0.123`, `1`).
fn localize(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" { "0".to_string() } else { s.to_string() }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitute `{{KEY}}` markers in a single left-to-right pass. Substituted
/// text is never rescanned; unknown markers are copied through verbatim.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, v)) => out.push_str(v),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// JSON embedded in a `<script>` block must not close the block early.
fn script_safe(json: String) -> String {
    json.replace("</", "<\\/")
}

const MAP_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous"></script>
  <style>
    html, body { height: 100%; margin: 0; }
    #map { position: absolute; inset: 0; }
    .risk-legend { background: rgba(255, 255, 255, 0.9); padding: 6px 10px; border-radius: 4px; font: 12px sans-serif; width: 220px; }
    .legend-caption { font-weight: 600; margin-bottom: 4px; }
    .legend-bar { height: 10px; border: 1px solid #333; }
    .legend-ticks { display: flex; justify-content: space-between; margin-top: 2px; }
    .leaflet-tooltip table th { text-align: left; padding-right: 6px; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    var map = L.map('map').setView({{CENTER}}, {{ZOOM}});
    L.tileLayer({{TILE_URL}}, { attribution: {{TILE_ATTRIBUTION}}, maxZoom: 19 }).addTo(map);

    var overlays = {{OVERLAYS}};
    overlays.features.forEach(function (feature) {
      L.geoJSON(feature, {
        style: function () { return feature.properties.style; }
      })
        .bindTooltip(feature.properties.tooltip, { sticky: true })
        .addTo(map);
    });

    var legend = L.control({ position: 'topright' });
    legend.onAdd = function () {
      var div = L.DomUtil.create('div', 'risk-legend');
      div.innerHTML = {{LEGEND}};
      return div;
    };
    legend.addTo(map);
  </script>
</body>
</html>
"#;
