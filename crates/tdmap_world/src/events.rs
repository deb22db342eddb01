//! # Map Events
//!
//! Chunk listeners push into a single relay queue owned by the map. After
//! every write the map drains that queue and fans each event out to its
//! subscribers, so every subscriber sees writes in the exact order they
//! happened.
//!
//! ```text
//! ┌─────────┐  ChunkChanged   ┌─────────────┐  MapChanged   ┌──────────────┐
//! │  Chunk  │────(listener)──>│ relay queue │──(drain)─────>│  MapEvents   │
//! └─────────┘  + chunk origin └─────────────┘  fan-out      │ (per caller) │
//!                                                           └──────────────┘
//! ```
//!
//! Subscriber channels are unbounded: a full-map generation pass emits one
//! event per tile, and dropping any of them would break the
//! every-write-is-seen contract. Drop the [`MapEvents`] handle to stop
//! receiving (and buffering) events.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::chunk::{ChunkChanged, ChunkCoord, TilePos};
use crate::resource::TileId;

/// A tile of the map was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapChanged {
    /// World position of the tile.
    pub position: TilePos,
    /// Identifier before the write.
    pub old: TileId,
    /// Identifier after the write.
    pub new: TileId,
}

impl MapChanged {
    /// Lifts a chunk event into world space.
    #[must_use]
    pub fn from_chunk(coord: ChunkCoord, size: usize, event: &ChunkChanged) -> Self {
        Self {
            position: coord.tile_pos(event.position, size),
            old: event.old.clone(),
            new: event.new.clone(),
        }
    }
}

/// Subscriber handle for map events.
pub struct MapEvents {
    receiver: Receiver<MapChanged>,
}

impl MapEvents {
    /// Receives all pending events (non-blocking).
    #[must_use]
    pub fn drain(&self) -> Vec<MapChanged> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    ///
    /// Returns `None` if no events are pending.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<MapChanged> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

/// Relay queue plus subscriber list, owned by the map.
pub(crate) struct EventRelay {
    /// Cloned into every chunk listener.
    inbox: Sender<MapChanged>,
    /// Drained by the map after each write.
    outbox: Receiver<MapChanged>,
    subscribers: Vec<Sender<MapChanged>>,
}

impl EventRelay {
    pub(crate) fn new() -> Self {
        let (inbox, outbox) = unbounded();
        Self {
            inbox,
            outbox,
            subscribers: Vec::new(),
        }
    }

    /// A listener for a newly created chunk at `coord`.
    pub(crate) fn chunk_listener(
        &self,
        coord: ChunkCoord,
        size: usize,
    ) -> impl FnMut(&ChunkChanged) + Send + 'static {
        let inbox = self.inbox.clone();
        move |event| {
            // The relay owns the receiving end for as long as any chunk lives.
            let _ = inbox.send(MapChanged::from_chunk(coord, size, event));
        }
    }

    pub(crate) fn subscribe(&mut self) -> MapEvents {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        MapEvents { receiver }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Forwards every queued event to every live subscriber, pruning
    /// subscribers whose handle was dropped.
    pub(crate) fn flush(&mut self) {
        while let Ok(event) = self.outbox.try_recv() {
            match self.subscribers.len() {
                0 => {}
                1 => {
                    if self.subscribers[0].send(event).is_err() {
                        self.subscribers.clear();
                    }
                }
                _ => self
                    .subscribers
                    .retain(|subscriber| subscriber.send(event.clone()).is_ok()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::LocalPos;

    fn change(x: usize, y: usize) -> ChunkChanged {
        ChunkChanged {
            position: LocalPos::new(x, y),
            old: TileId::default(),
            new: TileId::new("builtin", "1").unwrap(),
        }
    }

    #[test]
    fn test_lift_to_world_space() {
        let event = MapChanged::from_chunk(ChunkCoord::new(-1, 2), 64, &change(63, 0));
        assert_eq!(event.position, TilePos::new(-1, 128));
    }

    #[test]
    fn test_relay_fans_out_in_order() {
        let mut relay = EventRelay::new();
        let first = relay.subscribe();
        let second = relay.subscribe();

        let mut listener = relay.chunk_listener(ChunkCoord::new(1, 0), 4);
        listener(&change(0, 0));
        listener(&change(1, 0));
        relay.flush();

        for events in [first.drain(), second.drain()] {
            let positions: Vec<_> = events.iter().map(|e| e.position).collect();
            assert_eq!(positions, vec![TilePos::new(4, 0), TilePos::new(5, 0)]);
        }
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut relay = EventRelay::new();
        let kept = relay.subscribe();
        drop(relay.subscribe());

        let mut listener = relay.chunk_listener(ChunkCoord::new(0, 0), 4);
        listener(&change(2, 2));
        relay.flush();

        assert_eq!(relay.subscriber_count(), 1);
        assert_eq!(kept.pending_count(), 1);
        assert!(kept.has_events());
        assert_eq!(kept.try_recv().map(|e| e.position), Some(TilePos::new(2, 2)));
        assert!(kept.try_recv().is_none());
    }

    #[test]
    fn test_flush_without_subscribers_discards() {
        let mut relay = EventRelay::new();
        let mut listener = relay.chunk_listener(ChunkCoord::new(0, 0), 4);
        listener(&change(0, 0));
        relay.flush();

        let late = relay.subscribe();
        relay.flush();
        assert!(!late.has_events());
    }
}
