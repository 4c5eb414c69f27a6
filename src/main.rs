use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use setvoronoi::config::Config;
use setvoronoi::pipeline::{prepare_output_dir, Pipeline, SEED_FILE};
use setvoronoi::sampling::read_parameter_file;
use setvoronoi::tessellation::VoroCommand;

/// Computes the set Voronoi diagram of a particle packing.
#[derive(Debug, Parser)]
#[command(name = "setvoronoi", version, about, long_about = None)]
struct Cli {
    /// Run configuration (TOML)
    config: PathBuf,
    /// Directory for all output files; created if missing
    output: PathBuf,
}

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("setvoronoi=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;
    let pipeline = Pipeline::from_config(&config)?;
    prepare_output_dir(&cli.output)
        .with_context(|| format!("cannot use output directory {}", cli.output.display()))?;

    let particles = read_parameter_file(&config.positions)?;
    let sampler = config.sampler()?;
    let engine = VoroCommand::new(config.engine.program.clone(), cli.output.join(SEED_FILE))
        .with_gnuplot(config.engine.gnuplot);

    let output = pipeline.execute(&particles, sampler.as_ref(), &engine)?;
    output
        .write_to(&cli.output)
        .with_context(|| format!("failed to write results to {}", cli.output.display()))?;

    let report = &output.report;
    info!(
        particles = report.particles,
        seeds = report.seeds,
        skipped_seeds = report.skipped_seeds.len(),
        dropped_faces = report.dropped_faces.len(),
        points = report.mesh_points,
        faces = report.mesh_faces,
        "set voronoi diagram done"
    );
    Ok(())
}
