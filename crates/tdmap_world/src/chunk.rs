//! # Chunk System
//!
//! The map is partitioned into square chunks of `size x size` tiles
//! (64 by default). A chunk is the unit of lazy allocation and of change
//! notification.
//!
//! ## Coordinates
//!
//! - [`TilePos`]: world tile coordinate, any `i32`
//! - [`ChunkCoord`]: `floor(world / size)` on each axis
//! - [`LocalPos`]: `world mod size`, always in `[0, size)`
//!
//! Floor division, not truncation: world x = -1 lives in chunk -1 at local
//! x = `size - 1`.
//!
//! ## Storage
//!
//! Cells are stored row-major (`y * size + x`), which is also the order
//! [`Chunk::iter`] yields them in.

use std::fmt;
use std::iter::FusedIterator;

use crate::error::{MapError, MapResult};
use crate::resource::TileId;

/// Default chunk edge length in tiles.
pub const CHUNK_SIZE: usize = 64;

/// Largest accepted chunk edge length.
pub const MAX_CHUNK_SIZE: usize = 4096;

/// World tile coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    /// X coordinate (in tiles).
    pub x: i32,
    /// Y coordinate (in tiles).
    pub y: i32,
}

impl TilePos {
    /// Creates a new tile position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk containing this tile, for chunks of `size` tiles.
    #[inline]
    #[must_use]
    pub const fn chunk(self, size: usize) -> ChunkCoord {
        ChunkCoord::from_tile_pos(self, size)
    }

    /// Position of this tile inside its chunk.
    #[inline]
    #[must_use]
    pub const fn local(self, size: usize) -> LocalPos {
        let size = size as i32;
        LocalPos {
            x: self.x.rem_euclid(size) as usize,
            y: self.y.rem_euclid(size) as usize,
        }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cell position inside a chunk, each axis in `[0, size)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalPos {
    /// Local X (column).
    pub x: usize,
    /// Local Y (row).
    pub y: usize,
}

impl LocalPos {
    /// Creates a new local position.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for LocalPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Chunk coordinate (identifies a chunk in the map grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: i32,
    /// Y coordinate (in chunks, not tiles).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk containing `pos`, for chunks of `size` tiles.
    #[inline]
    #[must_use]
    pub const fn from_tile_pos(pos: TilePos, size: usize) -> Self {
        Self {
            x: pos.x.div_euclid(size as i32),
            y: pos.y.div_euclid(size as i32),
        }
    }

    /// World position of the chunk's origin (top-left corner).
    ///
    /// For the lowest chunk of an axis the origin can lie below `i32::MIN`
    /// when `size` does not divide 2^31; it wraps in that case.
    #[inline]
    #[must_use]
    pub const fn origin(self, size: usize) -> TilePos {
        TilePos {
            x: self.x.wrapping_mul(size as i32),
            y: self.y.wrapping_mul(size as i32),
        }
    }

    /// World position of a cell of this chunk.
    ///
    /// Computed in `i64`: the origin may be out of `i32` range while the
    /// cell itself is not. Exact for every coordinate produced by
    /// [`TilePos::chunk`] and [`TilePos::local`].
    #[inline]
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn tile_pos(self, local: LocalPos, size: usize) -> TilePos {
        let size = size as i64;
        TilePos {
            x: (self.x as i64 * size + local.x as i64) as i32,
            y: (self.y as i64 * size + local.y as i64) as i32,
        }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// A cell of a chunk was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkChanged {
    /// Cell that was written.
    pub position: LocalPos,
    /// Identifier before the write.
    pub old: TileId,
    /// Identifier after the write.
    pub new: TileId,
}

/// Callback run synchronously on every cell write.
pub type ChunkListener = Box<dyn FnMut(&ChunkChanged) + Send>;

/// A square grid of tile identifiers.
///
/// Every cell always holds an identifier: the default given at
/// construction until it is overwritten. A chunk does not know its own
/// coordinate; the [`Map`](crate::Map) that owns it does.
///
/// Listeners receive `&ChunkChanged` while the chunk is mutably borrowed,
/// so a listener cannot write back into the chunk that notified it.
pub struct Chunk {
    size: usize,
    /// Row-major cells: `tiles[y * size + x]`.
    tiles: Box<[TileId]>,
    listeners: Vec<ChunkListener>,
}

impl Chunk {
    /// Creates a `CHUNK_SIZE` chunk with every cell set to `default`.
    #[must_use]
    pub fn new(default: TileId) -> Self {
        Self::filled(CHUNK_SIZE, default)
    }

    /// Creates a `size x size` chunk with every cell set to `default`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] unless `size` is in
    /// `1..=MAX_CHUNK_SIZE`.
    pub fn with_size(size: usize, default: TileId) -> MapResult<Self> {
        if size == 0 || size > MAX_CHUNK_SIZE {
            return Err(MapError::InvalidConfig(format!(
                "chunk size must be in 1..={MAX_CHUNK_SIZE}, got {size}"
            )));
        }
        Ok(Self::filled(size, default))
    }

    fn filled(size: usize, default: TileId) -> Self {
        Self {
            size,
            tiles: vec![default; size * size].into_boxed_slice(),
            listeners: Vec::new(),
        }
    }

    /// Edge length in tiles.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> MapResult<usize> {
        if x < self.size && y < self.size {
            Ok(y * self.size + x)
        } else {
            Err(MapError::OutOfRange {
                x,
                y,
                size: self.size,
            })
        }
    }

    /// Gets the identifier at local coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfRange`] if either coordinate is outside
    /// `[0, size)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> MapResult<&TileId> {
        let index = self.index(x, y)?;
        Ok(&self.tiles[index])
    }

    /// Writes a cell and notifies every listener, returning the previous
    /// identifier.
    ///
    /// Listeners fire even when `id` equals the current value.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfRange`] if either coordinate is outside
    /// `[0, size)`; nothing is written or notified in that case.
    pub fn set(&mut self, x: usize, y: usize, id: TileId) -> MapResult<TileId> {
        let index = self.index(x, y)?;
        let old = std::mem::replace(&mut self.tiles[index], id);

        if !self.listeners.is_empty() {
            let event = ChunkChanged {
                position: LocalPos::new(x, y),
                old: old.clone(),
                new: self.tiles[index].clone(),
            };
            for listener in &mut self.listeners {
                listener(&event);
            }
        }

        Ok(old)
    }

    /// [`get`](Self::get) by [`LocalPos`].
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    #[inline]
    pub fn get_at(&self, pos: LocalPos) -> MapResult<&TileId> {
        self.get(pos.x, pos.y)
    }

    /// [`set`](Self::set) by [`LocalPos`].
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    #[inline]
    pub fn set_at(&mut self, pos: LocalPos, id: TileId) -> MapResult<TileId> {
        self.set(pos.x, pos.y, id)
    }

    /// Registers a listener for cell writes.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&ChunkChanged) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Iterates `(position, identifier)` in row-major order: x fastest,
    /// then y. Every call starts a fresh traversal.
    #[must_use]
    pub fn iter(&self) -> Tiles<'_> {
        Tiles {
            size: self.size,
            inner: self.tiles.iter().enumerate(),
        }
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("size", &self.size)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a Chunk {
    type Item = (LocalPos, &'a TileId);
    type IntoIter = Tiles<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major iterator over a chunk's cells.
#[derive(Clone)]
pub struct Tiles<'a> {
    size: usize,
    inner: std::iter::Enumerate<std::slice::Iter<'a, TileId>>,
}

impl<'a> Iterator for Tiles<'a> {
    type Item = (LocalPos, &'a TileId);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (index, id) = self.inner.next()?;
        Some((LocalPos::new(index % self.size, index / self.size), id))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Tiles<'_> {}
impl FusedIterator for Tiles<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn tile(path: &str) -> TileId {
        TileId::new("builtin", path).unwrap()
    }

    #[test]
    fn test_chunk_coord_from_tile() {
        let size = 16;
        let coord = |x, y| TilePos::new(x, y).chunk(size);
        assert_eq!(coord(0, 0), ChunkCoord::new(0, 0));
        assert_eq!(coord(15, 15), ChunkCoord::new(0, 0));
        assert_eq!(coord(16, 16), ChunkCoord::new(1, 1));
        assert_eq!(coord(-1, -1), ChunkCoord::new(-1, -1));
        assert_eq!(coord(-16, -16), ChunkCoord::new(-1, -1));
        assert_eq!(coord(-17, -17), ChunkCoord::new(-2, -2));
    }

    #[test]
    fn test_local_is_never_negative() {
        let pos = TilePos::new(-1, 0);
        assert_eq!(pos.chunk(CHUNK_SIZE), ChunkCoord::new(-1, 0));
        assert_eq!(pos.local(CHUNK_SIZE), LocalPos::new(CHUNK_SIZE - 1, 0));

        let pos = TilePos::new(130, 5);
        assert_eq!(pos.chunk(CHUNK_SIZE), ChunkCoord::new(2, 0));
        assert_eq!(pos.local(CHUNK_SIZE), LocalPos::new(2, 5));
    }

    #[test]
    fn test_world_local_round_trip() {
        for (x, y) in [(0, 0), (63, 64), (-1, -64), (-65, 129), (1000, -1000)] {
            let pos = TilePos::new(x, y);
            let coord = pos.chunk(CHUNK_SIZE);
            assert_eq!(coord.tile_pos(pos.local(CHUNK_SIZE), CHUNK_SIZE), pos);
        }
    }

    #[test]
    fn test_round_trip_at_axis_extremes() {
        for size in [1, 3, 7, 64, MAX_CHUNK_SIZE - 1] {
            for (x, y) in [(i32::MIN, 0), (i32::MAX, i32::MIN), (i32::MIN + 1, i32::MAX)] {
                let pos = TilePos::new(x, y);
                let coord = pos.chunk(size);
                assert_eq!(coord.tile_pos(pos.local(size), size), pos, "size {size}");
            }
        }
    }

    #[test]
    fn test_with_size_bounds() {
        assert!(Chunk::with_size(1, TileId::default()).is_ok());
        assert_eq!(
            Chunk::with_size(MAX_CHUNK_SIZE, TileId::default()).unwrap().size(),
            MAX_CHUNK_SIZE
        );
        for size in [0, MAX_CHUNK_SIZE + 1, usize::MAX] {
            assert!(matches!(
                Chunk::with_size(size, TileId::default()),
                Err(MapError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_default_coverage() {
        let default = TileId::default();
        let chunk = Chunk::new(default.clone());

        assert_eq!(chunk.iter().count(), CHUNK_SIZE * CHUNK_SIZE);
        for y in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                assert_eq!(chunk.get(x, y).unwrap(), &default);
            }
        }
    }

    #[test]
    fn test_out_of_range() {
        let mut chunk = Chunk::new(TileId::default());
        assert_eq!(
            chunk.get(CHUNK_SIZE, 0),
            Err(MapError::OutOfRange {
                x: CHUNK_SIZE,
                y: 0,
                size: CHUNK_SIZE
            })
        );
        assert!(chunk.get(0, CHUNK_SIZE).is_err());
        assert!(chunk.set(0, CHUNK_SIZE + 3, tile("1")).is_err());
        assert_eq!(chunk.get(0, 0).unwrap(), &TileId::default());
    }

    #[test]
    fn test_write_notifies_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut chunk = Chunk::new(TileId::default());
        let sink = Arc::clone(&events);
        chunk.on_change(move |event| sink.lock().push(event.clone()));

        let previous = chunk.set(3, 5, tile("2")).unwrap();
        assert_eq!(previous, TileId::default());
        assert_eq!(chunk.get(3, 5).unwrap(), &tile("2"));

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            ChunkChanged {
                position: LocalPos::new(3, 5),
                old: TileId::default(),
                new: tile("2"),
            }
        );
    }

    #[test]
    fn test_same_value_write_still_notifies() {
        let count = Arc::new(Mutex::new(0));
        let mut chunk = Chunk::new(tile("0"));
        let sink = Arc::clone(&count);
        chunk.on_change(move |_| *sink.lock() += 1);

        chunk.set(0, 0, tile("0")).unwrap();
        chunk.set(0, 0, tile("0")).unwrap();
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_failed_write_does_not_notify() {
        let count = Arc::new(Mutex::new(0));
        let mut chunk = Chunk::with_size(2, tile("0")).unwrap();
        let sink = Arc::clone(&count);
        chunk.on_change(move |_| *sink.lock() += 1);

        assert!(chunk.set(2, 0, tile("1")).is_err());
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_every_listener_sees_every_write() {
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));
        let mut chunk = Chunk::with_size(4, tile("0")).unwrap();
        let sink = Arc::clone(&first);
        chunk.on_change(move |_| *sink.lock() += 1);
        let sink = Arc::clone(&second);
        chunk.on_change(move |_| *sink.lock() += 1);

        chunk.set(1, 1, tile("1")).unwrap();
        chunk.set_at(LocalPos::new(2, 3), tile("2")).unwrap();

        assert_eq!(chunk.listener_count(), 2);
        assert_eq!(*first.lock(), 2);
        assert_eq!(*second.lock(), 2);
    }

    #[test]
    fn test_iteration_is_row_major_and_restartable() {
        let mut chunk = Chunk::with_size(3, tile("0")).unwrap();
        chunk.set(2, 0, tile("1")).unwrap();
        chunk.set(0, 1, tile("2")).unwrap();

        let positions: Vec<_> = chunk.iter().map(|(pos, _)| (pos.x, pos.y)).collect();
        assert_eq!(
            positions,
            vec![
                (0, 0), (1, 0), (2, 0),
                (0, 1), (1, 1), (2, 1),
                (0, 2), (1, 2), (2, 2),
            ]
        );

        let first: Vec<_> = chunk.iter().map(|(_, id)| id.path().to_string()).collect();
        let second: Vec<_> = (&chunk).into_iter().map(|(_, id)| id.path().to_string()).collect();
        assert_eq!(first, second);
        assert_eq!(first[2], "1");
        assert_eq!(first[3], "2");
        assert_eq!(chunk.iter().len(), 9);
    }
}
