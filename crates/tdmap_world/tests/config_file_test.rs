//! # Config File Tests
//!
//! The shipped `config/world.toml` must match the built-in defaults.

use std::path::Path;

use tdmap_world::{Map, SimplexNoiseSource, WorldConfig};

fn shipped_config() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/world.toml")
}

/// Test: shipped file equals the defaults.
#[test]
fn test_shipped_config_matches_defaults() {
    let config = WorldConfig::load(shipped_config()).unwrap();
    assert_eq!(config, WorldConfig::default());
}

/// Test: a loaded config drives a map.
#[test]
fn test_config_builds_map() {
    let mut config = WorldConfig::load(shipped_config()).unwrap();
    config.map.world_size = 64;

    let noise = SimplexNoiseSource::new(config.seed, config.noise.fractal());
    let mut map = Map::new(noise, config.map).unwrap();
    let report = map.generate(config.seed).unwrap();

    assert_eq!(report.tiles_written, 64 * 64);
    assert_eq!(map.chunk_count(), 1);
}
