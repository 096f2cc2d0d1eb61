use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let dir = tmp.path().to_path_buf();
        Self { _tmp: tmp, dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// GeoJSON FeatureCollection with one small square per name.
    pub fn write_regions(&self, file: &str, field: &str, names: &[&str]) -> PathBuf {
        let features: Vec<serde_json::Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let x = -6.0 + i as f64;
                serde_json::json!({
                    "type": "Feature",
                    "properties": { field: name },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[x, 51.0], [x + 1.0, 51.0], [x + 1.0, 52.0], [x, 52.0], [x, 51.0]]]
                    }
                })
            })
            .collect();
        let path = self.path(file);
        let fc = serde_json::json!({ "type": "FeatureCollection", "features": features });
        fs::write(&path, fc.to_string()).expect("write regions");
        path
    }
}
