//! # Map
//!
//! A sparse grid of lazily materialized chunks plus the generation pass
//! that fills it from a noise source.
//!
//! ## Generation
//!
//! ```text
//! for x in 0..world_size          (outer)
//!   for y in 0..world_size        (inner)
//!     sample -> classify -> tile id -> set_tile
//! ```
//!
//! The loop order is observable: chunks are created, and events emitted,
//! in exactly this order.
//!
//! ## Failure
//!
//! A failed pass leaves whatever was written before the failure in place.
//! Run `generate` again before relying on the contents.

use std::fmt;
use std::time::{Duration, Instant};

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::chunk::{Chunk, ChunkCoord, TilePos};
use crate::classifier::{CategoryTiles, NoiseClassifier, TileCategory, CATEGORY_COUNT};
use crate::config::MapConfig;
use crate::error::MapResult;
use crate::events::{EventRelay, MapEvents};
use crate::noise::NoiseSource;
use crate::resource::TileId;

/// Summary of one generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationReport {
    /// Seed the pass ran with.
    pub seed: i32,
    /// Cells written.
    pub tiles_written: u64,
    /// Chunks materialized by this pass.
    pub chunks_created: usize,
    /// Cells written per category, indexed by [`TileCategory::index`].
    pub category_counts: [u64; CATEGORY_COUNT],
    /// Wall time of the pass.
    pub elapsed: Duration,
}

impl GenerationReport {
    /// Cells written with `category`.
    #[must_use]
    pub const fn count(&self, category: TileCategory) -> u64 {
        self.category_counts[category.index()]
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seed {}: {} tiles, {} new chunks in {:.2?}",
            self.seed, self.tiles_written, self.chunks_created, self.elapsed
        )
    }
}

/// The tile map.
///
/// Owns its chunks, its noise source and the subscriber list for
/// [`MapChanged`](crate::MapChanged) events. A map has a single mutator;
/// every write goes through `&mut self`.
pub struct Map<N: NoiseSource> {
    noise: N,
    config: MapConfig,
    classifier: NoiseClassifier,
    category_tiles: CategoryTiles,
    chunks: IndexMap<ChunkCoord, Chunk>,
    relay: EventRelay,
}

impl<N: NoiseSource> Map<N> {
    /// Creates an empty map. No generation work happens here.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`](crate::MapError::InvalidConfig)
    /// if `config` fails validation.
    pub fn new(noise: N, config: MapConfig) -> MapResult<Self> {
        config.validate()?;
        let classifier = NoiseClassifier::new(config.thresholds)?;
        let category_tiles = CategoryTiles::new(&config.tile_namespace)?;

        Ok(Self {
            noise,
            config,
            classifier,
            category_tiles,
            chunks: IndexMap::new(),
            relay: EventRelay::new(),
        })
    }

    /// Creates an empty map with the reference settings.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_noise(noise: N) -> MapResult<Self> {
        Self::new(noise, MapConfig::default())
    }

    /// Subscribes to every subsequent cell write, in world coordinates.
    pub fn subscribe(&mut self) -> MapEvents {
        self.relay.subscribe()
    }

    /// Writes a tile, materializing its chunk if needed, and returns the
    /// previous identifier.
    ///
    /// # Errors
    ///
    /// Propagates [`MapError::OutOfRange`](crate::MapError::OutOfRange)
    /// from the chunk, which floor-division coordinates never trigger.
    pub fn set_tile(&mut self, pos: TilePos, id: TileId) -> MapResult<TileId> {
        let size = self.config.chunk_size;
        let coord = pos.chunk(size);

        let chunk = match self.chunks.entry(coord) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut chunk = Chunk::with_size(size, self.config.default_tile.clone())?;
                chunk.on_change(self.relay.chunk_listener(coord, size));
                tracing::debug!(%coord, size, "chunk materialized");
                entry.insert(chunk)
            }
        };

        let old = chunk.set_at(pos.local(size), id)?;
        self.relay.flush();
        Ok(old)
    }

    /// The tile at `pos`, or `None` if its chunk was never materialized.
    #[must_use]
    pub fn tile(&self, pos: TilePos) -> Option<&TileId> {
        let size = self.config.chunk_size;
        self.chunks
            .get(&pos.chunk(size))
            .and_then(|chunk| chunk.get_at(pos.local(size)).ok())
    }

    /// The chunk at `coord`, if materialized.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Iterates chunks in creation order. Every call starts a fresh
    /// traversal.
    pub fn chunks(&self) -> impl ExactSizeIterator<Item = (ChunkCoord, &Chunk)> + '_ {
        self.chunks.iter().map(|(coord, chunk)| (*coord, chunk))
    }

    /// Number of materialized chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The map settings.
    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// The noise source.
    #[must_use]
    pub const fn noise(&self) -> &N {
        &self.noise
    }

    /// The noise source, mutably.
    pub fn noise_mut(&mut self) -> &mut N {
        &mut self.noise
    }

    /// Fills `[0, world_size)²` from the noise source.
    ///
    /// Seeds the source, applies the configured frequency, then writes one
    /// classified tile per cell, x-outer and y-inner. Cells outside the
    /// square, and chunks materialized earlier, are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::GenerationFailed`](crate::MapError::GenerationFailed)
    /// if the noise source rejects the seed or frequency.
    pub fn generate(&mut self, seed: i32) -> MapResult<GenerationReport> {
        let start = Instant::now();
        let chunks_before = self.chunks.len();

        self.noise.set_seed(seed)?;
        self.noise.set_frequency(self.config.frequency)?;

        let extent = self.config.world_size as i32;
        let mut category_counts = [0u64; CATEGORY_COUNT];

        for x in 0..extent {
            for y in 0..extent {
                let sample = self.noise.sample_2d(x as f32, y as f32);
                let category = self.classifier.classify(sample);
                let id = self.category_tiles.get(category).clone();
                self.set_tile(TilePos::new(x, y), id)?;
                category_counts[category.index()] += 1;
            }
        }

        let report = GenerationReport {
            seed,
            tiles_written: category_counts.iter().sum(),
            chunks_created: self.chunks.len() - chunks_before,
            category_counts,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            seed,
            world_size = self.config.world_size,
            chunks = self.chunks.len(),
            elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
            "map generated"
        );

        Ok(report)
    }
}
