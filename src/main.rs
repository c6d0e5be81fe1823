//! Vulnerability Index batch run
//!
//! Loads boundaries and indicator tables, scores every unit and writes the
//! enriched GeoJSON plus summary files.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use vulnerability_index::aggregate::{province_summaries, rank_summaries};
use vulnerability_index::output::{self, RunSummary};
use vulnerability_index::{BatchRunner, Indicator, Metric, PipelineConfig, WeightScheme, load_boundaries};

#[derive(Parser, Debug)]
#[command(name = "vulnerability_index", about = "Compute the composite regional vulnerability index", version)]
struct Cli {
    /// JSON configuration file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the directory holding the indicator and boundary files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Score with housing, sewer and social only
    #[arg(long)]
    without_rainfall: bool,

    /// Resolve units in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if cli.without_rainfall {
        config.weights = WeightScheme::WithoutRainfall;
    }
    config.parallel |= cli.parallel;

    let start = Instant::now();
    let runner = BatchRunner::from_config(&config).context("loading indicator tables")?;
    let boundaries = load_boundaries(&config.boundary_paths()).context("loading boundaries")?;
    info!("Inputs loaded in {:?}", start.elapsed());

    let result = runner.run(&boundaries.units);
    let summary = RunSummary::new(runner.scheme(), &result, &runner.tables().reports);
    let written = output::write_all(&config.output_dir, &boundaries.collection, &result, &summary, config.top_k)
        .context("writing outputs")?;

    println!("Scored {} units in {:?}", result.records.len(), start.elapsed());
    for indicator in Indicator::ALL {
        if let Some(diag) = result.diagnostics.get(indicator) {
            println!(
                "  {:<9} {:>6} matched {:>6} fallback ({:.1}%)",
                indicator.name(),
                diag.success,
                diag.failure,
                diag.success_rate() * 100.0
            );
        }
    }

    let mut provinces = province_summaries(&result.records);
    rank_summaries(&mut provinces, Metric::Composite);
    if let Some(worst) = provinces.first() {
        println!("Most vulnerable province: {} ({:.2})", worst.region, worst.composite);
    }
    for path in &written {
        println!("  wrote {}", path.display());
    }

    Ok(())
}
