//! # TDMAP World
//!
//! Chunked procedural tile map.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and settings always produce the same map
//! 2. **Chunked**: The map is stored as lazily created fixed-size chunks
//! 3. **Observable**: Every cell write is published, in order, in world coordinates
//! 4. **Injected noise**: The map drives any [`NoiseSource`] it is given
//!
//! ## Core Components
//!
//! - [`ResourceId`] / [`TileId`]: validated `kind@namespace:path` keys
//! - [`Chunk`]: square grid of tile ids with change listeners
//! - [`NoiseClassifier`]: noise sample to tile category
//! - [`Map`]: chunk storage, generation pass, [`MapChanged`] events
//! - [`WorldConfig`]: TOML configuration
//!
//! ## Example
//!
//! ```rust
//! use tdmap_world::{Map, MapConfig, SimplexNoiseSource, TilePos};
//!
//! let config = MapConfig::default().with_world_size(16).with_chunk_size(8);
//! let mut map = Map::new(SimplexNoiseSource::default(), config)?;
//! let events = map.subscribe();
//!
//! let report = map.generate(42)?;
//! assert_eq!(report.tiles_written, 256);
//! assert_eq!(map.chunk_count(), 4);
//! assert_eq!(events.pending_count(), 256);
//! assert_eq!(map.tile(TilePos::new(3, 3)).unwrap().kind(), "tile");
//! # Ok::<(), tdmap_world::MapError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod map;
pub mod noise;
pub mod resource;

pub use chunk::{
    Chunk, ChunkChanged, ChunkCoord, ChunkListener, LocalPos, TilePos, CHUNK_SIZE, MAX_CHUNK_SIZE,
};
pub use classifier::{CategoryTiles, NoiseClassifier, Thresholds, TileCategory, CATEGORY_COUNT};
pub use config::{MapConfig, NoiseConfig, WorldConfig};
pub use error::{FormatError, MapError, MapResult, NoiseError};
pub use events::{MapChanged, MapEvents};
pub use map::{GenerationReport, Map};
pub use noise::{Fractal, NoiseSource, SimplexNoise, SimplexNoiseSource, WorldSeed};
pub use resource::{ResourceId, ResourceKind, Texture, TextureId, Tile, TileId, TypedResourceId};
