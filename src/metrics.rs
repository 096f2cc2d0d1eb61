use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{info, warn};

use crate::error::Result;
use crate::types::ClaimMetric;

/// Claim counts are drawn from `[CLAIM_COUNT_MIN, CLAIM_COUNT_MAX)`.
pub const CLAIM_COUNT_MIN: u32 = 50;
pub const CLAIM_COUNT_MAX: u32 = 1_000;

/// Draw one synthetic claims record per region from a single stream.
///
/// Draw order is fixed: every claim count first (in `names` order), then
/// every risk score. Reordering `names` therefore changes which values each
/// region receives. A name that appears more than once still consumes its
/// draws; the first occurrence's record is the one kept.
pub fn generate_metrics<S: AsRef<str>>(
    names: &[S],
    rng: &mut impl Rng,
) -> HashMap<String, ClaimMetric> {
    let counts: Vec<u32> = names
        .iter()
        .map(|_| rng.random_range(CLAIM_COUNT_MIN..CLAIM_COUNT_MAX))
        .collect();
    let scores: Vec<f64> = names.iter().map(|_| rng.random::<f64>()).collect();

    let mut metrics = HashMap::with_capacity(names.len());
    for ((name, claim_count), risk_score) in names.iter().zip(counts).zip(scores) {
        let name = name.as_ref();
        if metrics.contains_key(name) {
            warn!("duplicate region name {name:?}; keeping first metric");
            continue;
        }
        metrics.insert(
            name.to_string(),
            ClaimMetric { region_name: name.to_string(), claim_count, risk_score },
        );
    }

    info!("Generated {} claim metrics", metrics.len());
    metrics
}

/// [`generate_metrics`] with a fresh `ChaCha20Rng` seeded from `seed`.
pub fn generate_metrics_seeded<S: AsRef<str>>(
    names: &[S],
    seed: u64,
) -> HashMap<String, ClaimMetric> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    generate_metrics(names, &mut rng)
}

/// Write the claims table as NDJSON, one record per line, in `order`.
/// Names in `order` without a metric are skipped.
pub fn write_metrics_ndjson<S: AsRef<str>>(
    metrics: &HashMap<String, ClaimMetric>,
    order: &[S],
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0;
    for name in order {
        if let Some(m) = metrics.get(name.as_ref()) {
            serde_json::to_writer(&mut writer, m)?;
            writeln!(writer)?;
            written += 1;
        }
    }
    writer.flush()?;
    info!("Wrote {written} claim metrics to {:?}", path);
    Ok(written)
}
