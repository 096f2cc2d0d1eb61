//! Region loading from GeoJSON and ESRI Shapefile sources.

use std::fs;
use std::path::Path;

use geojson::{Feature, GeoJson, Geometry, Value};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use tracing::{debug, info, warn};

use crate::error::{MapError, Result};
use crate::types::Region;

/// Load named regions from `source`, in file order.
///
/// The existence check runs before any reader is opened, so a missing file
/// always surfaces as [`MapError::MissingInput`] rather than a reader error.
pub fn load_regions(source: impl AsRef<Path>, name_field: &str) -> Result<Vec<Region>> {
    let path = source.as_ref();
    if !path.exists() {
        return Err(MapError::MissingInput { path: path.to_path_buf() });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    info!("Loading regions from {:?}", path);
    let regions = match ext.as_deref() {
        Some("shp") => load_shapefile(path, name_field)?,
        Some("geojson") | Some("json") => load_geojson(path, name_field)?,
        _ => return Err(MapError::UnsupportedFormat { path: path.to_path_buf() }),
    };

    if regions.is_empty() {
        warn!("{:?} contains no regions", path);
    }
    info!("Loaded {} regions", regions.len());
    Ok(regions)
}

// ── GeoJSON ───────────────────────────────────────────────────────────────────

fn load_geojson(path: &Path, name_field: &str) -> Result<Vec<Region>> {
    let text = fs::read_to_string(path)?;
    let parsed = text.parse::<GeoJson>().map_err(|e| MapError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let features: Vec<Feature> = match parsed {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(MapError::Parse {
                path: path.to_path_buf(),
                message: "bare geometry has no attributes; expected a FeatureCollection".to_string(),
            });
        }
    };
    debug!("{} GeoJSON features", features.len());

    features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let name = feature
                .property(name_field)
                .and_then(json_name)
                .ok_or_else(|| MapError::MissingField { field: name_field.to_string(), index })?;
            let geometry = feature
                .geometry
                .ok_or_else(|| MapError::MissingField { field: "geometry".to_string(), index })?;
            Ok(Region { name, geometry })
        })
        .collect()
}

/// Region names are usually strings, but numeric codes are accepted too.
fn json_name(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Shapefile ─────────────────────────────────────────────────────────────────

/// dBASE caps attribute names at 10 characters.
const DBF_FIELD_NAME_MAX: usize = 10;

fn load_shapefile(path: &Path, name_field: &str) -> Result<Vec<Region>> {
    if name_field.len() > DBF_FIELD_NAME_MAX {
        warn!(
            "name field {name_field:?} is longer than {DBF_FIELD_NAME_MAX} characters and cannot exist in a .dbf"
        );
    }
    let pairs = shapefile::read_as::<_, Shape, Record>(path).map_err(|e| MapError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!("{} shapefile records", pairs.len());

    pairs
        .into_iter()
        .enumerate()
        .map(|(index, (shape, record))| {
            let name = record
                .get(name_field)
                .and_then(dbf_name)
                .ok_or_else(|| MapError::MissingField { field: name_field.to_string(), index })?;
            let geometry = match &shape {
                Shape::Polygon(p) => rings_to_geometry(p.rings(), |pt| (pt.x, pt.y)),
                Shape::PolygonM(p) => rings_to_geometry(p.rings(), |pt| (pt.x, pt.y)),
                Shape::PolygonZ(p) => rings_to_geometry(p.rings(), |pt| (pt.x, pt.y)),
                Shape::NullShape => None,
                other => {
                    return Err(MapError::Parse {
                        path: path.to_path_buf(),
                        message: format!("record {index}: expected polygon, found {:?}", other.shapetype()),
                    });
                }
            }
            .ok_or_else(|| MapError::MissingField { field: "geometry".to_string(), index })?;
            Ok(Region { name, geometry })
        })
        .collect()
}

fn dbf_name(value: &FieldValue) -> Option<String> {
    let name = match value {
        FieldValue::Character(Some(s)) => s.trim().to_string(),
        FieldValue::Memo(s) => s.trim().to_string(),
        FieldValue::Numeric(Some(n)) => n.to_string(),
        FieldValue::Integer(n) => n.to_string(),
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

/// Group shapefile rings into GeoJSON polygons: every outer ring opens a new
/// polygon, inner rings attach to the most recent outer ring.
///
/// Returns `None` when there are no rings at all.
pub(crate) fn rings_to_geometry<P>(
    rings: &[PolygonRing<P>],
    xy: impl Fn(&P) -> (f64, f64),
) -> Option<Geometry> {
    let mut polygons: Vec<Vec<Vec<Vec<f64>>>> = Vec::new();

    for ring in rings {
        let coords: Vec<Vec<f64>> = ring
            .points()
            .iter()
            .map(|p| {
                let (x, y) = xy(p);
                vec![x, y]
            })
            .collect();
        match ring {
            PolygonRing::Outer(_) => polygons.push(vec![coords]),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some(polygon) => polygon.push(coords),
                // Hole before any shell: keep it as its own polygon.
                None => polygons.push(vec![coords]),
            },
        }
    }

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(|p| Geometry::new(Value::Polygon(p))),
        _ => Some(Geometry::new(Value::MultiPolygon(polygons))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use shapefile::Point;
    use tempfile::TempDir;

    use super::*;

    fn square(x: f64, y: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0], [x, y]]]
        })
    }

    fn write_collection(dir: &TempDir, file: &str, features: Vec<serde_json::Value>) -> std::path::PathBuf {
        let path = dir.path().join(file);
        let fc = serde_json::json!({ "type": "FeatureCollection", "features": features });
        fs::write(&path, fc.to_string()).unwrap();
        path
    }

    fn feature(name: serde_json::Value, x: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "properties": { "region_name": name },
            "geometry": square(x, 50.0)
        })
    }

    #[test]
    fn missing_path_is_reported_before_any_parse() {
        // The extension is unsupported too; the existence check must win.
        let err = load_regions("/no/such/dir/UK_regions.xyz", "region_name").unwrap_err();
        match err {
            MapError::MissingInput { path } => assert!(path.ends_with("UK_regions.xyz")),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn missing_shapefile_is_missing_input_not_reader_error() {
        let err = load_regions("/no/such/dir/UK_regions.shp", "region_name").unwrap_err();
        assert!(matches!(err, MapError::MissingInput { .. }));
    }

    #[test]
    fn geojson_regions_preserve_file_order() {
        let dir = TempDir::new().unwrap();
        let path = write_collection(
            &dir,
            "regions.geojson",
            vec![
                feature("North".into(), 0.0),
                feature("South".into(), 1.0),
                feature("East".into(), 2.0),
            ],
        );
        let regions = load_regions(&path, "region_name").unwrap();
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["North", "South", "East"]);
        assert!(matches!(regions[0].geometry.value, Value::Polygon(_)));
    }

    #[test]
    fn numeric_names_are_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write_collection(&dir, "codes.json", vec![feature(serde_json::json!(101), 0.0)]);
        let regions = load_regions(&path, "region_name").unwrap();
        assert_eq!(regions[0].name, "101");
    }

    #[test]
    fn feature_without_name_field_is_missing_field() {
        let dir = TempDir::new().unwrap();
        let path = write_collection(&dir, "r.geojson", vec![feature("North".into(), 0.0)]);
        let err = load_regions(&path, "NAME").unwrap_err();
        match err {
            MapError::MissingField { field, index } => {
                assert_eq!(field, "NAME");
                assert_eq!(index, 0);
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn feature_without_geometry_is_missing_field() {
        let dir = TempDir::new().unwrap();
        let f = serde_json::json!({
            "type": "Feature",
            "properties": { "region_name": "North" },
            "geometry": null
        });
        let path = write_collection(&dir, "r.geojson", vec![f]);
        let err = load_regions(&path, "region_name").unwrap_err();
        assert!(matches!(err, MapError::MissingField { ref field, .. } if field == "geometry"));
    }

    #[test]
    fn invalid_geojson_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.geojson");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_regions(&path, "region_name"), Err(MapError::Parse { .. })));
    }

    #[test]
    fn corrupt_shapefile_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("UK_regions.shp");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"this is not a shapefile").unwrap();
        assert!(matches!(load_regions(&path, "region_name"), Err(MapError::Parse { .. })));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regions.kml");
        fs::write(&path, "<kml/>").unwrap();
        assert!(matches!(
            load_regions(&path, "region_name"),
            Err(MapError::UnsupportedFormat { .. })
        ));
    }

    // ── Shapefile fixtures ────────────────────────────────────────────────────

    use shapefile::dbase::{FieldName, TableWriterBuilder};
    use shapefile::Polygon;

    fn square_ring(x: f64, y: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x, y + 1.0),
            Point::new(x + 1.0, y + 1.0),
            Point::new(x + 1.0, y),
            Point::new(x, y),
        ]
    }

    /// Three records: two single-ring polygons and one two-part polygon.
    /// `NAME` is a character field, `CODE` a numeric one.
    fn write_shapefile(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("UK_regions.shp");
        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("NAME").unwrap(), 50)
            .add_numeric_field(FieldName::try_from("CODE").unwrap(), 10, 0);
        let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

        let shapes = [
            ("North", 101.0, Polygon::with_rings(vec![PolygonRing::Outer(square_ring(-3.0, 55.0))])),
            ("South", 102.0, Polygon::with_rings(vec![PolygonRing::Outer(square_ring(-1.0, 51.0))])),
            (
                "East",
                103.0,
                Polygon::with_rings(vec![
                    PolygonRing::Outer(square_ring(0.0, 52.0)),
                    PolygonRing::Outer(square_ring(1.5, 52.0)),
                ]),
            ),
        ];
        for (name, code, polygon) in &shapes {
            let mut record = Record::default();
            record.insert("NAME".to_string(), FieldValue::Character(Some(name.to_string())));
            record.insert("CODE".to_string(), FieldValue::Numeric(Some(*code)));
            writer.write_shape_and_record(polygon, &record).unwrap();
        }
        drop(writer);
        path
    }

    #[test]
    fn shapefile_regions_preserve_file_order() {
        let dir = TempDir::new().unwrap();
        let path = write_shapefile(&dir);
        let regions = load_regions(&path, "NAME").unwrap();

        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["North", "South", "East"]);
        assert!(matches!(regions[0].geometry.value, Value::Polygon(_)));
        assert!(matches!(regions[1].geometry.value, Value::Polygon(_)));
        match &regions[2].geometry.value {
            Value::MultiPolygon(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected MultiPolygon, got {other:?}"),
        }
    }

    #[test]
    fn shapefile_numeric_name_field_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write_shapefile(&dir);
        let regions = load_regions(&path, "CODE").unwrap();
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["101", "102", "103"]);
    }

    #[test]
    fn shapefile_coordinates_pass_through_as_lon_lat() {
        let dir = TempDir::new().unwrap();
        let path = write_shapefile(&dir);
        let regions = load_regions(&path, "NAME").unwrap();
        let Value::Polygon(rings) = &regions[0].geometry.value else {
            panic!("expected Polygon");
        };
        assert!(rings[0].contains(&vec![-3.0, 55.0]));
        assert!(rings[0].iter().all(|p| p.len() == 2));
    }

    #[test]
    fn dbf_field_names_longer_than_ten_never_match() {
        let dir = TempDir::new().unwrap();
        let path = write_shapefile(&dir);
        let err = load_regions(&path, "region_name").unwrap_err();
        assert!(matches!(err, MapError::MissingField { ref field, index: 0 } if field == "region_name"));
    }

    // ── Ring grouping ─────────────────────────────────────────────────────────

    fn ring(offset: f64) -> Vec<Point> {
        vec![
            Point::new(offset, 0.0),
            Point::new(offset, 1.0),
            Point::new(offset + 1.0, 1.0),
            Point::new(offset, 0.0),
        ]
    }

    #[test]
    fn single_outer_ring_becomes_polygon() {
        let rings = vec![PolygonRing::Outer(ring(0.0))];
        let g = rings_to_geometry(&rings, |p| (p.x, p.y)).unwrap();
        match g.value {
            Value::Polygon(p) => {
                assert_eq!(p.len(), 1);
                assert_eq!(p[0][0], vec![0.0, 0.0]);
            }
            other => panic!("expected Polygon, got {other:?}"),
        }
    }

    #[test]
    fn holes_attach_to_preceding_shell() {
        let rings = vec![
            PolygonRing::Outer(ring(0.0)),
            PolygonRing::Inner(ring(0.2)),
            PolygonRing::Outer(ring(5.0)),
        ];
        let g = rings_to_geometry(&rings, |p| (p.x, p.y)).unwrap();
        match g.value {
            Value::MultiPolygon(polys) => {
                assert_eq!(polys.len(), 2);
                assert_eq!(polys[0].len(), 2, "first polygon keeps its hole");
                assert_eq!(polys[1].len(), 1);
            }
            other => panic!("expected MultiPolygon, got {other:?}"),
        }
    }

    #[test]
    fn no_rings_yields_none() {
        let rings: Vec<PolygonRing<Point>> = Vec::new();
        assert!(rings_to_geometry(&rings, |p| (p.x, p.y)).is_none());
    }
}
