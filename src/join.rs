use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::UnmatchedPolicy;
use crate::error::{MapError, Result};
use crate::types::{ClaimMetric, Region};

/// Result of joining regions to their metrics by name.
#[derive(Debug, Clone, Default)]
pub struct Joined {
    /// Matched pairs, in region order.
    pub pairs: Vec<(Region, ClaimMetric)>,
    /// Names of regions that had no metric, in region order.
    pub unmatched: Vec<String>,
}

/// Inner join on region name. Unmatched regions are left out of `pairs` and
/// reported in `unmatched`; nothing is logged here.
pub fn join_regions_to_metrics(
    regions: Vec<Region>,
    metrics: &HashMap<String, ClaimMetric>,
) -> Joined {
    let mut joined = Joined { pairs: Vec::with_capacity(regions.len()), unmatched: Vec::new() };
    for region in regions {
        match metrics.get(&region.name) {
            Some(m) => joined.pairs.push((region, m.clone())),
            None => joined.unmatched.push(region.name),
        }
    }
    joined
}

/// Join and then resolve unmatched regions according to `policy`.
///
/// `Default` performs a left join: the unmatched regions are kept in their
/// original position with `claim_count = 0` and the configured risk score.
pub fn join_with_policy(
    regions: Vec<Region>,
    metrics: &HashMap<String, ClaimMetric>,
    policy: UnmatchedPolicy,
) -> Result<Vec<(Region, ClaimMetric)>> {
    match policy {
        UnmatchedPolicy::Drop => {
            let joined = join_regions_to_metrics(regions, metrics);
            if !joined.unmatched.is_empty() {
                warn!(
                    "dropping {} region(s) with no claim metric: {}",
                    joined.unmatched.len(),
                    joined.unmatched.join(", ")
                );
            }
            info!("Joined {} regions", joined.pairs.len());
            Ok(joined.pairs)
        }
        UnmatchedPolicy::Fail => {
            let joined = join_regions_to_metrics(regions, metrics);
            if !joined.unmatched.is_empty() {
                return Err(MapError::UnmatchedRegions { names: joined.unmatched });
            }
            info!("Joined {} regions", joined.pairs.len());
            Ok(joined.pairs)
        }
        UnmatchedPolicy::Default { risk_score } => {
            let mut filled = 0;
            let pairs: Vec<(Region, ClaimMetric)> = regions
                .into_iter()
                .map(|region| {
                    let metric = metrics.get(&region.name).cloned().unwrap_or_else(|| {
                        filled += 1;
                        ClaimMetric { region_name: region.name.clone(), claim_count: 0, risk_score }
                    });
                    (region, metric)
                })
                .collect();
            if filled > 0 {
                warn!("{filled} region(s) had no claim metric; using default risk {risk_score}");
            }
            info!("Joined {} regions", pairs.len());
            Ok(pairs)
        }
    }
}
