//! # TDMAP Driver
//!
//! Generates a map headlessly and prints what came out.
//!
//! ```bash
//! # Reference world (seed 42, 1024 x 1024)
//! tdmap
//!
//! # Custom config, smaller world, debug logging
//! RUST_LOG=tdmap_world=debug tdmap --config config/world.toml --world-size 128
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tdmap_world::{GenerationReport, Map, SimplexNoiseSource, TileCategory, WorldConfig};
use tracing_subscriber::EnvFilter;

/// Headless procedural tile map generator
#[derive(Parser, Debug)]
#[command(name = "tdmap")]
#[command(about = "Generate a chunked tile map from seeded noise", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file; built-in reference values if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed, overriding the config file
    #[arg(short, long)]
    seed: Option<i32>,

    /// World edge length in tiles, overriding the config file
    #[arg(short, long)]
    world_size: Option<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = load_config(&cli)?;
    let noise = SimplexNoiseSource::new(config.seed, config.noise.fractal());
    let mut map = Map::new(noise, config.map.clone()).context("failed to build map")?;
    let events = map.subscribe();

    tracing::info!(
        seed = config.seed,
        world_size = config.map.world_size,
        chunk_size = config.map.chunk_size,
        "generating"
    );
    let report = map
        .generate(config.seed)
        .with_context(|| format!("generation with seed {} failed", config.seed))?;

    print_summary(&report, map.chunk_count(), events.drain().len());
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<WorldConfig> {
    let mut config = match &cli.config {
        Some(path) => WorldConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => WorldConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(world_size) = cli.world_size {
        config.map.world_size = world_size;
    }

    config.validate().context("invalid config after overrides")?;
    Ok(config)
}

fn print_summary(report: &GenerationReport, chunks: usize, events: usize) {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  {report}");
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  chunks:  {chunks}");
    println!("  events:  {events}");
    println!("  elapsed: {:.2?}", report.elapsed);
    println!("  tiles by category:");

    let total = report.tiles_written.max(1) as f64;
    for category in TileCategory::all() {
        let count = report.count(category);
        println!(
            "    {category}: {count:>9} ({:5.1}%)",
            count as f64 / total * 100.0
        );
    }
}
