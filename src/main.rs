//! UK motor insurance risk map CLI
//!
//! Usage:
//!   riskmap --input UK_regions.shp \
//!           --output uk_motor_insurance_claims_risk_map.html \
//!           --seed 42

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use riskmap::{MapConfig, UnmatchedPolicy, pipeline};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_UNMATCHED_RISK: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnUnmatched {
    /// Drop regions without a metric (inner join)
    Drop,
    /// Fail the run, naming the unmatched regions
    Fail,
    /// Keep them with zero claims and `--default-risk`
    Default,
}

#[derive(Parser, Debug)]
#[command(name = "riskmap", version, about = "Render a choropleth map of regional motor insurance risk")]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Geometry source (.shp, .geojson or .json)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output HTML file (overwritten if present)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Attribute holding each region's name. Shapefile (.dbf) attribute
    /// names are at most 10 characters, so the default `region_name` only
    /// matches GeoJSON sources; pass the real column (e.g. `NAME`) for .shp
    #[arg(long)]
    name_field: Option<String>,

    /// Seed for the synthetic claims stream
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the generated claims table as NDJSON
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// How to treat regions that end up without a metric
    #[arg(long, value_enum)]
    on_unmatched: Option<OnUnmatched>,

    /// Risk score for unmatched regions [default: 0.5]; needs `--on-unmatched`
    #[arg(long, requires = "on_unmatched")]
    default_risk: Option<f64>,

    /// Page title
    #[arg(long)]
    title: Option<String>,

    /// Suppress the confirmation line and info logging
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = build_config(&args)?;
    let report = pipeline::run(&config)?;

    if !args.quiet {
        println!("Map has been saved at {}", report.output.display());
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<MapConfig> {
    let mut config = match &args.config {
        Some(path) => MapConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MapConfig::canonical(),
    };

    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(field) = &args.name_field {
        config.name_field = field.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(path) = &args.metrics_out {
        config.metrics_out = Some(path.clone());
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(mode) = args.on_unmatched {
        config.on_unmatched = match mode {
            OnUnmatched::Drop => UnmatchedPolicy::Drop,
            OnUnmatched::Fail => UnmatchedPolicy::Fail,
            OnUnmatched::Default => UnmatchedPolicy::Default {
                risk_score: args.default_risk.unwrap_or(DEFAULT_UNMATCHED_RISK),
            },
        };
    }
    if let Some(risk) = args.default_risk {
        match &mut config.on_unmatched {
            UnmatchedPolicy::Default { risk_score } => *risk_score = risk,
            _ => anyhow::bail!("--default-risk only applies with `--on-unmatched default`"),
        }
    }
    Ok(config)
}
