//! # Configuration
//!
//! All generation constants live in a TOML file loaded once at startup.
//! Every field is optional and defaults to the reference value:
//!
//! ```toml
//! seed = 42
//!
//! [map]
//! world_size = 1024
//! chunk_size = 64
//! frequency = 0.1
//! default_tile = "tile@builtin:default"
//! tile_namespace = "builtin"
//! thresholds = [-0.5, -0.25, 0.25, 0.5]
//!
//! [noise]
//! octaves = 1
//! persistence = 0.5
//! lacunarity = 2.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunk::{CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::classifier::Thresholds;
use crate::error::{MapError, MapResult};
use crate::noise::Fractal;
use crate::resource::{is_word, TileId, BUILTIN_NAMESPACE};

/// Largest accepted world edge length.
pub const MAX_WORLD_SIZE: u32 = 1 << 20;

/// Map generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Edge length of the generated square, in tiles.
    pub world_size: u32,
    /// Edge length of a chunk, in tiles.
    pub chunk_size: usize,
    /// Noise frequency applied at the start of every generation pass.
    pub frequency: f32,
    /// Fill for cells of a new chunk that have not been written yet.
    pub default_tile: TileId,
    /// Namespace of the per-category tiles (`tile@{namespace}:0` ...).
    pub tile_namespace: String,
    /// Category cut points.
    pub thresholds: Thresholds,
}

impl MapConfig {
    /// Reference world edge length.
    pub const DEFAULT_WORLD_SIZE: u32 = 1024;
    /// Reference noise frequency.
    pub const DEFAULT_FREQUENCY: f32 = 0.1;

    /// Sets the world size.
    #[must_use]
    pub const fn with_world_size(mut self, world_size: u32) -> Self {
        self.world_size = world_size;
        self
    }

    /// Sets the chunk size.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the noise frequency.
    #[must_use]
    pub const fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets the default tile.
    #[must_use]
    pub fn with_default_tile(mut self, default_tile: TileId) -> Self {
        self.default_tile = default_tile;
        self
    }

    /// Checks sizes, namespace and thresholds.
    ///
    /// Frequency is left to the noise source, which rejects it at the
    /// start of a generation pass.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> MapResult<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(MapError::InvalidConfig(format!(
                "chunk_size must be in 1..={MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if self.world_size > MAX_WORLD_SIZE {
            return Err(MapError::InvalidConfig(format!(
                "world_size must be at most {MAX_WORLD_SIZE}, got {}",
                self.world_size
            )));
        }
        if !is_word(&self.tile_namespace) {
            return Err(MapError::InvalidConfig(format!(
                "tile_namespace `{}` is not a word",
                self.tile_namespace
            )));
        }
        self.thresholds.validate()
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            world_size: Self::DEFAULT_WORLD_SIZE,
            chunk_size: CHUNK_SIZE,
            frequency: Self::DEFAULT_FREQUENCY,
            default_tile: TileId::default(),
            tile_namespace: BUILTIN_NAMESPACE.to_string(),
            thresholds: Thresholds::DEFAULT,
        }
    }
}

/// Fractal settings of the stock noise source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseConfig {
    /// Number of noise layers.
    pub octaves: u32,
    /// Amplitude multiplier per layer.
    pub persistence: f32,
    /// Frequency multiplier per layer.
    pub lacunarity: f32,
}

impl NoiseConfig {
    /// Checks the fractal settings.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> MapResult<()> {
        if !(1..=16).contains(&self.octaves) {
            return Err(MapError::InvalidConfig(format!(
                "octaves must be in 1..=16, got {}",
                self.octaves
            )));
        }
        if !self.persistence.is_finite() || self.persistence <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "persistence must be positive, got {}",
                self.persistence
            )));
        }
        if !self.lacunarity.is_finite() || self.lacunarity <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "lacunarity must be positive, got {}",
                self.lacunarity
            )));
        }
        Ok(())
    }

    /// As fractal settings for [`SimplexNoiseSource`](crate::SimplexNoiseSource).
    #[must_use]
    pub const fn fractal(&self) -> Fractal {
        Fractal {
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        let fractal = Fractal::default();
        Self {
            octaves: fractal.octaves,
            persistence: fractal.persistence,
            lacunarity: fractal.lacunarity,
        }
    }
}

/// Complete configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Seed of the generation pass.
    pub seed: i32,
    /// Map settings.
    pub map: MapConfig,
    /// Noise settings.
    pub noise: NoiseConfig,
}

impl WorldConfig {
    /// Reference seed.
    pub const DEFAULT_SEED: i32 = 42;

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] on syntax errors, unknown
    /// fields, malformed identifiers or failed validation.
    pub fn from_toml_str(text: &str) -> MapResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| MapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] if the file cannot be read or
    /// fails [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MapError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> MapResult<String> {
        toml::to_string_pretty(self).map_err(|e| MapError::InvalidConfig(e.to_string()))
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first section's error.
    pub fn validate(&self) -> MapResult<()> {
        self.map.validate()?;
        self.noise.validate()
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            map: MapConfig::default(),
            noise: NoiseConfig::default(),
        }
    }
}
