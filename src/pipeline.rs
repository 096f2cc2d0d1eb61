use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::info;

use crate::config::MapConfig;
use crate::error::Result;
use crate::join::join_with_policy;
use crate::metrics::{generate_metrics, write_metrics_ndjson};
use crate::regions::load_regions;
use crate::render::{render, save};

/// Summary of one end-to-end run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub regions_loaded: usize,
    pub metrics_generated: usize,
    pub overlays_rendered: usize,
    pub output: PathBuf,
    pub metrics_out: Option<PathBuf>,
}

/// load → generate → join → render → save, driven entirely by `config`.
pub fn run(config: &MapConfig) -> Result<RunReport> {
    config.validate()?;

    let regions = load_regions(&config.input, &config.name_field)?;
    let names: Vec<String> = regions.iter().map(|r| r.name.clone()).collect();

    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
    let metrics = generate_metrics(&names, &mut rng);

    let regions_loaded = regions.len();
    let joined = join_with_policy(regions, &metrics, config.on_unmatched)?;
    let artifact = render(joined, config);
    save(&artifact, &config.output)?;

    // Only dump the claims table once the map itself has been written.
    if let Some(path) = &config.metrics_out {
        write_metrics_ndjson(&metrics, &names, path)?;
    }

    info!(
        "Run complete: {} regions, {} overlays (seed {})",
        regions_loaded,
        artifact.overlays.len(),
        config.seed
    );

    Ok(RunReport {
        regions_loaded,
        metrics_generated: metrics.len(),
        overlays_rendered: artifact.overlays.len(),
        output: config.output.clone(),
        metrics_out: config.metrics_out.clone(),
    })
}
